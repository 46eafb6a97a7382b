//! Error types for strata-records

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Field type {name} is not registered")]
    UnknownFieldType { name: String },

    #[error("Schema declares no fields")]
    EmptySchema,

    #[error("Schema declares the optional marker more than once")]
    DuplicateOptionalMarker,

    #[error("Line filled {filled} of {required} required fields: {line}")]
    Parse {
        line: String,
        required: usize,
        filled: usize,
    },

    #[error("Printed {printed} of {filled} filled fields")]
    Serialize { printed: usize, filled: usize },

    #[error("Section name must not be empty")]
    EmptySectionName,

    #[error("Section {name} is declared twice")]
    DuplicateSection { name: String },

    #[error("Unknown section: {name}")]
    UnknownSection { name: String },

    #[error(transparent)]
    Fs(#[from] strata_fs::Error),
}
