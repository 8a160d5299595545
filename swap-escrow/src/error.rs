use solana_program::{decode_error::DecodeError, program_error::ProgramError};
use thiserror::Error;

/// Custom codes start at 6000 so they never collide with token program errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum EscrowError {
    #[error("Offered and wanted amounts must be greater than zero")]
    InvalidAmount = 6000,
    #[error("An offer with this id already exists for the maker")]
    DuplicateOffer,
    #[error("Offer does not exist or was already settled")]
    OfferNotFound,
    #[error("Source token account does not hold enough tokens")]
    InsufficientBalance,
    #[error("Token account or mint does not match the offer")]
    MintMismatch,
    #[error("Signer is not allowed to perform this operation")]
    Unauthorized,
    #[error("Offered and wanted mints must be different")]
    SameMint,
    #[error("Maker account does not match the offer")]
    MakerMismatch,
    #[error("Token account is not the associated account for its owner and mint")]
    InvalidTokenAccount,
    #[error("Vault does not hold exactly the offered amount")]
    VaultBalanceMismatch,
    #[error("Settlement transfer did not deliver the exact amount")]
    SettlementMismatch,
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl TryFrom<u32> for EscrowError {
    type Error = ProgramError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        use EscrowError::*;

        [
            InvalidAmount,
            DuplicateOffer,
            OfferNotFound,
            InsufficientBalance,
            MintMismatch,
            Unauthorized,
            SameMint,
            MakerMismatch,
            InvalidTokenAccount,
            VaultBalanceMismatch,
            SettlementMismatch,
        ]
        .into_iter()
        .find(|e| *e as u32 == code)
        .ok_or(ProgramError::InvalidArgument)
    }
}

impl<T> DecodeError<T> for EscrowError {
    fn type_of() -> &'static str {
        "EscrowError"
    }
}
