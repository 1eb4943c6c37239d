use std::fmt;

/// Shader stage a compile diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Pipeline assembly after both stages compiled
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
            ShaderStage::Link => f.write_str("link"),
        }
    }
}

/// Errors that can occur while setting up or driving the pipeline.
///
/// Every variant is a configuration error caught once at startup. None of
/// them are transient, so nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Setup failed for {resource}: {reason}")]
    Setup { resource: String, reason: String },

    #[error("Render target '{name}' is not renderable: {reason}")]
    TargetConfiguration { name: &'static str, reason: String },

    #[error("Program '{program}' failed at {stage} stage: {diagnostic}")]
    Compile {
        program: &'static str,
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("Program '{program}' declares no input named '{input}'")]
    Binding {
        program: &'static str,
        input: &'static str,
    },

    #[error("Pass '{pass}' reads the target '{target}' it draws into")]
    Feedback {
        pass: &'static str,
        target: &'static str,
    },
}

impl Error {
    pub fn setup(resource: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Setup {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
