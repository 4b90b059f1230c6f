use thiserror::Error;

/// Error taxonomy for the ISO-TP core.
///
/// Every codec and engine function returns one of these instead of the
/// small negative `errno`-style integers the protocol is traditionally
/// specified with; the variant names mirror that taxonomy one-for-one so a
/// reader familiar with the wire-level spec can map straight across.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IsoTpError {
    #[error("invalid argument")]
    Invalid,

    #[error("value out of range")]
    OutOfRange,

    #[error("payload would overflow the destination frame or buffer")]
    Overflow,

    #[error("receive buffer too small for the declared payload")]
    NoBufferSpace,

    #[error("malformed frame header or unexpected PCI")]
    BadMessage,

    #[error("frame does not carry the expected PCI")]
    NoMessage,

    #[error("reserved code or reserved field combination")]
    Unsupported,

    #[error("frame too short for its declared content")]
    MsgSize,

    #[error("protocol timer (N_As/N_Ar/N_Bs/N_Cr) elapsed")]
    TimedOut,

    #[error("transfer aborted (FC.OVFLW, FC.WAIT limit, or sequence mismatch)")]
    ConnAborted,

    #[error("internal invariant violated")]
    Fault,

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, IsoTpError>;
