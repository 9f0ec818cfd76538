/// Log tags identify the subsystem a message comes from.
///
/// Each tag has a debug key used by the `--debug-<key>` command-line flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Api,
    Feed,
    Decoder,
    Classifier,
    Pipeline,
    Report,
}

impl LogTag {
    pub const ALL: [LogTag; 8] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Api,
        LogTag::Feed,
        LogTag::Decoder,
        LogTag::Classifier,
        LogTag::Pipeline,
        LogTag::Report,
    ];

    /// Key used in `--debug-<key>` flags
    pub fn to_debug_key(&self) -> String {
        self.to_plain_string().to_lowercase()
    }

    /// Uncolored label used in the log file
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Api => "API",
            LogTag::Feed => "FEED",
            LogTag::Decoder => "DECODER",
            LogTag::Classifier => "CLASSIFY",
            LogTag::Pipeline => "PIPELINE",
            LogTag::Report => "REPORT",
        }
        .to_string()
    }

    pub fn from_debug_key(key: &str) -> Option<LogTag> {
        LogTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.to_debug_key() == key)
    }
}
