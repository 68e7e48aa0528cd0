use thiserror::Error;

/// All errors that the crate can generate
///
/// Content that is too large for the available space is never an error: it is
/// clamped and reported through `log::warn!`. Only broken contracts between the
/// layout engine and its callers surface here.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("region index {index} is out of range, only {len} regions were produced")]
    /// A region was requested beyond the produced sequence; the caller and the
    /// paginator disagree about how far printing has progressed
    RegionIndex { index: usize, len: usize },

    #[error("cell ({row}, {col}) is outside of the grid")]
    /// A grid source was asked for a cell it does not have
    CellOutOfRange { row: usize, col: usize },

    #[error("formatting cell ({row}, {col}) failed: {message}")]
    /// The formatting or script layer failed to produce a cell's content
    Script {
        row: usize,
        col: usize,
        message: String,
    },

    #[error(transparent)]
    /// An I/O error occurred
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// [owned_ttf_parser] failed to parse the font
    FaceParsing(#[from] owned_ttf_parser::FaceParsingError),
}
