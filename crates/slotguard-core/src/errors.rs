use thiserror::Error;

/// Result type alias using LayoutError
pub type Result<T> = std::result::Result<T, LayoutError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and CLI output. None of these kinds describe an
/// unsafe upgrade: layout differences are always reported as findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    /// A type descriptor is missing a required field (e.g. a byte size)
    MalformedLayout,
    /// A type descriptor cannot describe real storage (empty struct, zero-length array)
    StructuralImpossibility,
    /// A snapshot document does not have the expected shape
    InvalidSnapshot,
    /// A configuration file could not be parsed
    InvalidConfig,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::MalformedLayout => "ERR_MALFORMED_LAYOUT",
            ExErrorKind::StructuralImpossibility => "ERR_STRUCTURAL_IMPOSSIBILITY",
            ExErrorKind::InvalidSnapshot => "ERR_INVALID_SNAPSHOT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// True for errors caused by the layouts or files handed to the checker,
    /// as opposed to failures of the checker itself.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, ExErrorKind::Internal)
    }
}

/// Canonical structured error type
///
/// Carries a classification kind plus the context needed to point a user at
/// the offending unit and variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    unit: Option<String>,
    variable: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            unit: None,
            variable: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add contract-unit context
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Add variable path context
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the contract-unit context, if any
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Get the variable path context, if any
    pub fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(unit) = &self.unit {
            write!(f, " (unit: {})", unit)?;
        }
        if let Some(variable) = &self.variable {
            write!(f, " (variable: {})", variable)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Errors raised while interpreting a layout
///
/// Every variant names the offending variable by its dotted path
/// (`Vault.positions[].owner`). A layout that merely differs from another is
/// never an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    // ===== Malformed input =====
    /// A fixed-size kind was declared without a byte size
    #[error("type `{label}` of `{variable}` has no byte size")]
    MissingSize { variable: String, label: String },

    /// A kind that is always fixed-size was declared dynamic
    #[error("type `{label}` of `{variable}` cannot be dynamically sized")]
    UnexpectedDynamicSize { variable: String, label: String },

    /// A value type was declared with zero bytes
    #[error("type `{label}` of `{variable}` has a zero byte size")]
    ZeroSize { variable: String, label: String },

    /// A packed value type is wider than one slot
    #[error("type `{label}` of `{variable}` is {width} bytes, wider than a {slot_width}-byte slot")]
    OversizedValue {
        variable: String,
        label: String,
        width: u32,
        slot_width: u32,
    },

    /// A slot hint whose byte offset lies outside the slot
    #[error("slot hint for `{variable}` has offset {offset}, outside a {slot_width}-byte slot")]
    InvalidSlotHint {
        variable: String,
        offset: u32,
        slot_width: u32,
    },

    // ===== Structural impossibility =====
    /// A struct with no members
    #[error("struct `{label}` of `{variable}` has no members")]
    EmptyStruct { variable: String, label: String },

    /// A fixed-size array of length zero
    #[error("fixed-size array `{label}` of `{variable}` has length 0")]
    ZeroLengthArray { variable: String, label: String },

    /// Slot arithmetic ran past the addressable range
    #[error("storage position of `{variable}` overflows the slot index range")]
    SlotOverflow { variable: String },
}

impl LayoutError {
    /// Path of the variable the error is about
    pub fn variable(&self) -> &str {
        match self {
            LayoutError::MissingSize { variable, .. }
            | LayoutError::UnexpectedDynamicSize { variable, .. }
            | LayoutError::ZeroSize { variable, .. }
            | LayoutError::OversizedValue { variable, .. }
            | LayoutError::InvalidSlotHint { variable, .. }
            | LayoutError::EmptyStruct { variable, .. }
            | LayoutError::ZeroLengthArray { variable, .. }
            | LayoutError::SlotOverflow { variable } => variable,
        }
    }

    /// Classification used when converting into [`ExError`]
    pub fn kind(&self) -> ExErrorKind {
        match self {
            LayoutError::MissingSize { .. }
            | LayoutError::UnexpectedDynamicSize { .. }
            | LayoutError::ZeroSize { .. }
            | LayoutError::OversizedValue { .. }
            | LayoutError::InvalidSlotHint { .. } => ExErrorKind::MalformedLayout,
            LayoutError::EmptyStruct { .. }
            | LayoutError::ZeroLengthArray { .. }
            | LayoutError::SlotOverflow { .. } => ExErrorKind::StructuralImpossibility,
        }
    }
}

impl From<LayoutError> for ExError {
    fn from(err: LayoutError) -> Self {
        ExError::new(err.kind())
            .with_variable(err.variable())
            .with_message(err.to_string())
    }
}
