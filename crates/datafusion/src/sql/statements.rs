use std::fmt;

/// Modifiers accepted on `CREATE OPEN` that the catalog does not act on yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CreateModifiers {
    pub or_replace: bool,
    pub temporary: bool,
    pub if_not_exists: bool,
}

/// A statement in the `OPEN` dialect.
///
/// Variants hold the raw captured text. JSON islands (`PROPS`, `SYNTAX`,
/// `OBJECTS`) are kept verbatim and only decoded by the request builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpenDicStatement {
    CreateUdo {
        object_type: String,
        name: Option<String>,
        alias: Option<String>,
        props: Option<String>,
        modifiers: CreateModifiers,
    },
    CreateBatch {
        object_type: String,
        objects: Option<String>,
        modifiers: CreateModifiers,
    },
    Show {
        object_type: String,
    },
    ShowTypes,
    ShowMappingForPlatformAndType {
        object_type: String,
        platform: String,
    },
    ShowPlatformsForType {
        object_type: String,
    },
    ShowAllPlatforms,
    ShowMappingsForPlatform {
        platform: String,
    },
    Sync {
        object_type: String,
        platform: Option<String>,
    },
    SyncAll {
        platform: String,
    },
    Define {
        object_type: String,
        props: Option<String>,
    },
    Alter {
        object_type: String,
        name: String,
        props: Option<String>,
    },
    Drop {
        object_type: String,
    },
    DropMapping {
        platform: String,
    },
    AddMapping {
        object_type: String,
        platform: String,
        syntax: Option<String>,
        props: Option<String>,
    },
}

impl OpenDicStatement {
    pub fn command_name(&self) -> &'static str {
        use OpenDicStatement::*;

        match self {
            CreateUdo { .. } => "CreateUdo",
            CreateBatch { .. } => "CreateBatch",
            Show { .. } => "Show",
            ShowTypes => "ShowTypes",
            ShowMappingForPlatformAndType { .. } => "ShowMappingForPlatformAndType",
            ShowPlatformsForType { .. } => "ShowPlatformsForType",
            ShowAllPlatforms => "ShowAllPlatforms",
            ShowMappingsForPlatform { .. } => "ShowMappingsForPlatform",
            Sync { .. } => "Sync",
            SyncAll { .. } => "SyncAll",
            Define { .. } => "Define",
            Alter { .. } => "Alter",
            Drop { .. } => "Drop",
            DropMapping { .. } => "DropMapping",
            AddMapping { .. } => "AddMapping",
        }
    }
}

impl fmt::Display for OpenDicStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use OpenDicStatement::*;

        match self {
            CreateUdo {
                object_type,
                name,
                alias,
                ..
            } => write!(
                f,
                "CreateUdo: type={object_type} name={} alias={}",
                name.as_deref().unwrap_or("<none>"),
                alias.as_deref().unwrap_or("<none>")
            ),
            CreateBatch { object_type, .. } => write!(f, "CreateBatch: type={object_type}"),
            Show { object_type } => write!(f, "Show: type={object_type}"),
            ShowTypes => write!(f, "ShowTypes"),
            ShowMappingForPlatformAndType {
                object_type,
                platform,
            } => write!(
                f,
                "ShowMappingForPlatformAndType: type={object_type} platform={platform}"
            ),
            ShowPlatformsForType { object_type } => {
                write!(f, "ShowPlatformsForType: type={object_type}")
            }
            ShowAllPlatforms => write!(f, "ShowAllPlatforms"),
            ShowMappingsForPlatform { platform } => {
                write!(f, "ShowMappingsForPlatform: platform={platform}")
            }
            Sync {
                object_type,
                platform,
            } => write!(
                f,
                "Sync: type={object_type} platform={}",
                platform.as_deref().unwrap_or("<default>")
            ),
            SyncAll { platform } => write!(f, "SyncAll: platform={platform}"),
            Define { object_type, .. } => write!(f, "Define: type={object_type}"),
            Alter {
                object_type, name, ..
            } => write!(f, "Alter: type={object_type} name={name}"),
            Drop { object_type } => write!(f, "Drop: type={object_type}"),
            DropMapping { platform } => write!(f, "DropMapping: platform={platform}"),
            AddMapping {
                object_type,
                platform,
                ..
            } => write!(f, "AddMapping: type={object_type} platform={platform}"),
        }
    }
}
