//! The two token programs an offer can be denominated in, behind one interface.
//!
//! The processor never looks at which program it is talking to; the token
//! program account passed with an instruction picks the implementation.

use solana_program::{
    instruction::Instruction, program_error::ProgramError, program_pack::Pack, pubkey::Pubkey,
};
use spl_associated_token_account::{
    get_associated_token_address_with_program_id,
    instruction::create_associated_token_account_idempotent,
};
use spl_token_2022::extension::StateWithExtensions;

/// The fields of a token account the escrow cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAccountState {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

pub trait TokenInterface {
    fn program_id(&self) -> Pubkey;

    fn unpack_account(&self, data: &[u8]) -> Result<TokenAccountState, ProgramError>;

    fn mint_decimals(&self, data: &[u8]) -> Result<u8, ProgramError>;

    fn transfer_checked(
        &self,
        source: &Pubkey,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
        amount: u64,
        decimals: u8,
    ) -> Result<Instruction, ProgramError>;

    fn close_account(
        &self,
        account: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
    ) -> Result<Instruction, ProgramError>;

    fn associated_address(&self, wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(wallet, mint, &self.program_id())
    }

    /// Creates `wallet`'s associated account for `mint` unless it already exists.
    fn create_associated_account(
        &self,
        payer: &Pubkey,
        wallet: &Pubkey,
        mint: &Pubkey,
    ) -> Instruction {
        create_associated_token_account_idempotent(payer, wallet, mint, &self.program_id())
    }
}

/// The legacy SPL token program.
pub struct SplToken;

/// Token-2022. Only the base account and mint state is read, extensions are ignored.
pub struct SplToken2022;

impl TokenInterface for SplToken {
    fn program_id(&self) -> Pubkey {
        spl_token::id()
    }

    fn unpack_account(&self, data: &[u8]) -> Result<TokenAccountState, ProgramError> {
        let account = spl_token::state::Account::unpack(data)?;
        Ok(TokenAccountState {
            mint: account.mint,
            owner: account.owner,
            amount: account.amount,
        })
    }

    fn mint_decimals(&self, data: &[u8]) -> Result<u8, ProgramError> {
        Ok(spl_token::state::Mint::unpack(data)?.decimals)
    }

    fn transfer_checked(
        &self,
        source: &Pubkey,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
        amount: u64,
        decimals: u8,
    ) -> Result<Instruction, ProgramError> {
        spl_token::instruction::transfer_checked(
            &spl_token::id(),
            source,
            mint,
            destination,
            authority,
            &[],
            amount,
            decimals,
        )
    }

    fn close_account(
        &self,
        account: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
    ) -> Result<Instruction, ProgramError> {
        spl_token::instruction::close_account(
            &spl_token::id(),
            account,
            destination,
            authority,
            &[],
        )
    }
}

impl TokenInterface for SplToken2022 {
    fn program_id(&self) -> Pubkey {
        spl_token_2022::id()
    }

    fn unpack_account(&self, data: &[u8]) -> Result<TokenAccountState, ProgramError> {
        let account = StateWithExtensions::<spl_token_2022::state::Account>::unpack(data)?.base;
        Ok(TokenAccountState {
            mint: account.mint,
            owner: account.owner,
            amount: account.amount,
        })
    }

    fn mint_decimals(&self, data: &[u8]) -> Result<u8, ProgramError> {
        Ok(StateWithExtensions::<spl_token_2022::state::Mint>::unpack(data)?
            .base
            .decimals)
    }

    fn transfer_checked(
        &self,
        source: &Pubkey,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
        amount: u64,
        decimals: u8,
    ) -> Result<Instruction, ProgramError> {
        spl_token_2022::instruction::transfer_checked(
            &spl_token_2022::id(),
            source,
            mint,
            destination,
            authority,
            &[],
            amount,
            decimals,
        )
    }

    fn close_account(
        &self,
        account: &Pubkey,
        destination: &Pubkey,
        authority: &Pubkey,
    ) -> Result<Instruction, ProgramError> {
        spl_token_2022::instruction::close_account(
            &spl_token_2022::id(),
            account,
            destination,
            authority,
            &[],
        )
    }
}

/// Picks the implementation for the token program account supplied by the caller.
pub fn token_interface(program_id: &Pubkey) -> Result<&'static dyn TokenInterface, ProgramError> {
    if *program_id == spl_token::id() {
        Ok(&SplToken)
    } else if *program_id == spl_token_2022::id() {
        Ok(&SplToken2022)
    } else {
        Err(ProgramError::IncorrectProgramId)
    }
}
