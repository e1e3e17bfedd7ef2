use datafusion::common::extensions_options;
use datafusion::config::ConfigExtension;
use datafusion::prelude::SessionConfig;

extensions_options! {
    /// Connection to the open catalog service
    pub struct CatalogConfig {
        /// Base URL of the catalog REST API
        pub uri: Option<String>, default = None
        /// Bearer token sent with every catalog request
        pub token: Option<String>, default = None
        /// Request timeout in seconds
        pub timeout_secs: Option<u64>, default = None
    }
}

extensions_options! {
    pub struct SyncConfig {
        /// Platform used by `SYNC OPEN <type>` without a `FOR` clause.
        pub default_platform: String, default = "datafusion".to_string()

        /// If enabled, `CREATE OPEN` replays the object's platform statements
        /// on the session after the object is created.
        pub dump_on_create: bool, default = true
    }
}

extensions_options! {
    pub struct OpenDicConfig {
        /// Configuration to connect to the open catalog server
        pub catalog: CatalogConfig, default = CatalogConfig::default()

        /// Configuration for replaying platform statements
        pub sync: SyncConfig, default = SyncConfig::default()
    }
}

impl ConfigExtension for OpenDicConfig {
    const PREFIX: &'static str = "opendic";
}

impl OpenDicConfig {
    pub fn session_config() -> SessionConfig {
        SessionConfig::new().with_option_extension(OpenDicConfig::default())
    }
}
