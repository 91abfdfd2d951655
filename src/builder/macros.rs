//! Macros for declaring state graphs with little boilerplate.

/// Generate a `State` implementation for a fieldless enum.
///
/// Besides the trait, the macro derives the serde traits, implements
/// `Display` as the state name, and adds a `from_name` constructor so
/// assistants that persist the bare name can restore the value.
///
/// # Example
///
/// ```
/// use switchyard::core::State;
/// use switchyard::state_enum;
///
/// state_enum! {
///     pub enum Shipment {
///         Packed,
///         InTransit,
///         Delivered,
///         Lost,
///     }
///     final: [Delivered, Lost]
///     error: [Lost]
/// }
///
/// assert_eq!(Shipment::InTransit.name(), "InTransit");
/// assert!(Shipment::Lost.is_error());
/// assert_eq!(Shipment::from_name("Delivered"), Some(Shipment::Delivered));
/// assert_eq!(Shipment::from_name("Returned"), None);
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Look a state up by its name.
            #[allow(dead_code)]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::core::State::name(self))
            }
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            #[allow(unreachable_patterns)]
            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }

            #[allow(unreachable_patterns)]
            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    _ => false,
                }
            }
        }
    };
}
