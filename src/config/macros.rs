/// Define a configuration section with embedded defaults
///
/// One declaration yields:
/// - the struct with public fields
/// - a `Default` impl built from the listed values
/// - serde support with `#[serde(default)]`, so partial TOML files fill the
///   gaps from the defaults
/// - `FIELDS`, the accepted TOML keys, used to warn about typos
///
/// # Example
/// ```
/// tradescan::config_struct! {
///     pub struct ReportConfig {
///         decimal_separator: String = ",".to_string(),
///     }
/// }
/// assert_eq!(ReportConfig::FIELDS, &["decimal_separator"]);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl $name {
            /// Keys accepted in this TOML section
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field_name)),*];
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
