use std::fmt;

/// Reasons a context could not be processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextErrorCode {
    CyclicIriMapping,
    KeywordRedefinition,
    InvalidRemoteContext,
    RecursiveContextInclusion,
    LoadingRemoteContextFailed,
    InvalidLocalContext,
    InvalidBaseIri,
    InvalidVocabMapping,
    InvalidDefaultLanguage,
    InvalidBaseDirection,
    InvalidTermDefinition,
    InvalidIriMapping,
    InvalidTypeMapping,
    InvalidReverseProperty,
    InvalidKeywordAlias,
    InvalidLanguageMapping,
}

impl ContextErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CyclicIriMapping => "CYCLIC_IRI_MAPPING",
            Self::KeywordRedefinition => "KEYWORD_REDEFINITION",
            Self::InvalidRemoteContext => "INVALID_REMOTE_CONTEXT",
            Self::RecursiveContextInclusion => "RECURSIVE_CONTEXT_INCLUSION",
            Self::LoadingRemoteContextFailed => "LOADING_REMOTE_CONTEXT_FAILED",
            Self::InvalidLocalContext => "INVALID_LOCAL_CONTEXT",
            Self::InvalidBaseIri => "INVALID_BASE_IRI",
            Self::InvalidVocabMapping => "INVALID_VOCAB_MAPPING",
            Self::InvalidDefaultLanguage => "INVALID_DEFAULT_LANGUAGE",
            Self::InvalidBaseDirection => "INVALID_BASE_DIRECTION",
            Self::InvalidTermDefinition => "INVALID_TERM_DEFINITION",
            Self::InvalidIriMapping => "INVALID_IRI_MAPPING",
            Self::InvalidTypeMapping => "INVALID_TYPE_MAPPING",
            Self::InvalidReverseProperty => "INVALID_REVERSE_PROPERTY",
            Self::InvalidKeywordAlias => "INVALID_KEYWORD_ALIAS",
            Self::InvalidLanguageMapping => "INVALID_LANGUAGE_MAPPING",
        }
    }
}

impl fmt::Display for ContextErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during JSON-LD processing.
///
/// Operation-level variants (`Expansion`, `Compaction`, ...) wrap the failure of an
/// inner step as their `source`, so the original error is never lost.
#[derive(Debug, thiserror::Error)]
pub enum JsonLdError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Context error ({code}): {message}")]
    Context {
        code: ContextErrorCode,
        message: String,
    },

    #[error("Expansion error: {message}")]
    Expansion {
        message: String,
        #[source]
        source: Option<Box<JsonLdError>>,
    },

    #[error("Compaction error: {message}")]
    Compaction {
        message: String,
        #[source]
        source: Option<Box<JsonLdError>>,
    },

    #[error("Flatten error: {message}")]
    Flatten {
        message: String,
        #[source]
        source: Option<Box<JsonLdError>>,
    },

    #[error("Frame error: {message}")]
    Frame {
        message: String,
        #[source]
        source: Option<Box<JsonLdError>>,
    },

    #[error("Normalize error: {message}")]
    Normalize {
        message: String,
        #[source]
        source: Option<Box<JsonLdError>>,
    },

    #[error("RDF conversion error: {message}")]
    RdfConversion {
        message: String,
        #[source]
        source: Option<Box<JsonLdError>>,
    },

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Syntax error: {0}")]
    Syntax(String),
}

/// Result type alias for JSON-LD operations.
pub type Result<T> = std::result::Result<T, JsonLdError>;

impl JsonLdError {
    pub fn invalid_input(msg: impl fmt::Display) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    pub fn context(code: ContextErrorCode, msg: impl fmt::Display) -> Self {
        Self::Context {
            code,
            message: msg.to_string(),
        }
    }

    pub fn compaction(msg: impl fmt::Display) -> Self {
        Self::Compaction {
            message: msg.to_string(),
            source: None,
        }
    }

    pub fn normalize(msg: impl fmt::Display) -> Self {
        Self::Normalize {
            message: msg.to_string(),
            source: None,
        }
    }

    pub fn rdf(msg: impl fmt::Display) -> Self {
        Self::RdfConversion {
            message: msg.to_string(),
            source: None,
        }
    }

    pub fn syntax(msg: impl fmt::Display) -> Self {
        Self::Syntax(msg.to_string())
    }

    pub fn wrap_expansion(self, msg: impl fmt::Display) -> Self {
        Self::Expansion {
            message: msg.to_string(),
            source: Some(Box::new(self)),
        }
    }

    pub fn wrap_compaction(self, msg: impl fmt::Display) -> Self {
        Self::Compaction {
            message: msg.to_string(),
            source: Some(Box::new(self)),
        }
    }

    pub fn wrap_flatten(self, msg: impl fmt::Display) -> Self {
        Self::Flatten {
            message: msg.to_string(),
            source: Some(Box::new(self)),
        }
    }

    pub fn wrap_frame(self, msg: impl fmt::Display) -> Self {
        Self::Frame {
            message: msg.to_string(),
            source: Some(Box::new(self)),
        }
    }

    pub fn wrap_normalize(self, msg: impl fmt::Display) -> Self {
        Self::Normalize {
            message: msg.to_string(),
            source: Some(Box::new(self)),
        }
    }

    pub fn wrap_rdf(self, msg: impl fmt::Display) -> Self {
        Self::RdfConversion {
            message: msg.to_string(),
            source: Some(Box::new(self)),
        }
    }

    /// Stable error code, suitable for matching in callers and tests.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Context { code, .. } => code.as_str(),
            Self::Expansion { .. } => "EXPANSION_ERROR",
            Self::Compaction { .. } => "COMPACT_ERROR",
            Self::Flatten { .. } => "FLATTEN_ERROR",
            Self::Frame { .. } => "FRAME_ERROR",
            Self::Normalize { .. } => "NORMALIZE_ERROR",
            Self::RdfConversion { .. } => "RDF_ERROR",
            Self::UnknownFormat(_) => "UNKNOWN_FORMAT",
            Self::Syntax(_) => "SYNTAX_ERROR",
        }
    }

    /// Walks the `source` chain down to the error that started the failure.
    pub fn root_cause(&self) -> &JsonLdError {
        match self {
            Self::Expansion {
                source: Some(inner),
                ..
            }
            | Self::Compaction {
                source: Some(inner),
                ..
            }
            | Self::Flatten {
                source: Some(inner),
                ..
            }
            | Self::Frame {
                source: Some(inner),
                ..
            }
            | Self::Normalize {
                source: Some(inner),
                ..
            }
            | Self::RdfConversion {
                source: Some(inner),
                ..
            } => inner.root_cause(),
            _ => self,
        }
    }
}
