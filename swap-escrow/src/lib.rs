//! Two-party token swap escrow.
//!
//! A maker locks mint A in a program-owned vault and names a price in mint B;
//! any taker paying that price receives the vault in the same transaction.

pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod token;

use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, msg, program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::error::EscrowError;

solana_program::declare_id!("25rZpGqeAjhSF2deWQV2B5n7orxhaqyXuhvt822JmfYL");

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

/// Runs one escrow instruction, logging escrow errors by message on failure.
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::process(program_id, accounts, instruction_data).map_err(|error| {
        if let ProgramError::Custom(code) = error {
            if let Ok(escrow_error) = EscrowError::try_from(code) {
                msg!("Error: {}", escrow_error);
            }
        }
        error
    })
}
