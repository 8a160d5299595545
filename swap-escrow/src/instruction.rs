use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::state::{find_offer_address, find_vault_address};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Deposit `offered_amount` of mint A into a fresh vault and record the offer.
    ///
    /// Accounts:
    /// 0. `[writable, signer]` maker
    /// 1. `[]` mint A
    /// 2. `[]` mint B
    /// 3. `[writable]` maker's token account for mint A
    /// 4. `[writable]` offer record PDA
    /// 5. `[writable]` vault (offer's associated account for mint A)
    /// 6. `[]` token program
    /// 7. `[]` associated token program
    /// 8. `[]` system program
    MakeOffer {
        id: u64,
        offered_amount: u64,
        wanted_amount: u64,
    },
    /// Pay the wanted amount of mint B to the maker and receive the vault.
    ///
    /// Accounts:
    /// 0. `[writable, signer]` taker
    /// 1. `[writable]` maker
    /// 2. `[]` mint A
    /// 3. `[]` mint B
    /// 4. `[writable]` taker's associated account for mint A
    /// 5. `[writable]` taker's token account for mint B
    /// 6. `[writable]` maker's associated account for mint B
    /// 7. `[writable]` offer record PDA
    /// 8. `[writable]` vault
    /// 9. `[]` token program
    /// 10. `[]` associated token program
    /// 11. `[]` system program
    TakeOffer,
    /// Return the vault to the maker and close the offer.
    ///
    /// Accounts:
    /// 0. `[writable, signer]` maker
    /// 1. `[]` mint A
    /// 2. `[writable]` maker's associated account for mint A
    /// 3. `[writable]` offer record PDA
    /// 4. `[writable]` vault
    /// 5. `[]` token program
    /// 6. `[]` associated token program
    /// 7. `[]` system program
    CancelOffer,
}

impl EscrowInstruction {
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        borsh::to_vec(self).map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}

#[allow(clippy::too_many_arguments)]
pub fn make_offer(
    program_id: &Pubkey,
    maker: &Pubkey,
    mint_a: &Pubkey,
    mint_b: &Pubkey,
    maker_token_a: &Pubkey,
    token_program_id: &Pubkey,
    id: u64,
    offered_amount: u64,
    wanted_amount: u64,
) -> Result<Instruction, ProgramError> {
    let (offer, _) = find_offer_address(program_id, maker, id);
    let vault = find_vault_address(program_id, maker, id, mint_a, token_program_id);

    let data = EscrowInstruction::MakeOffer {
        id,
        offered_amount,
        wanted_amount,
    }
    .pack()?;

    Ok(Instruction {
        program_id: *program_id,
        data,
        accounts: vec![
            AccountMeta::new(*maker, true),
            AccountMeta::new_readonly(*mint_a, false),
            AccountMeta::new_readonly(*mint_b, false),
            AccountMeta::new(*maker_token_a, false),
            AccountMeta::new(offer, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(*token_program_id, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    })
}

#[allow(clippy::too_many_arguments)]
pub fn take_offer(
    program_id: &Pubkey,
    taker: &Pubkey,
    maker: &Pubkey,
    mint_a: &Pubkey,
    mint_b: &Pubkey,
    taker_token_b: &Pubkey,
    token_program_id: &Pubkey,
    id: u64,
) -> Result<Instruction, ProgramError> {
    let (offer, _) = find_offer_address(program_id, maker, id);
    let vault = find_vault_address(program_id, maker, id, mint_a, token_program_id);
    let ata = |wallet: &Pubkey, mint: &Pubkey| {
        spl_associated_token_account::get_associated_token_address_with_program_id(
            wallet,
            mint,
            token_program_id,
        )
    };

    Ok(Instruction {
        program_id: *program_id,
        data: EscrowInstruction::TakeOffer.pack()?,
        accounts: vec![
            AccountMeta::new(*taker, true),
            AccountMeta::new(*maker, false),
            AccountMeta::new_readonly(*mint_a, false),
            AccountMeta::new_readonly(*mint_b, false),
            AccountMeta::new(ata(taker, mint_a), false),
            AccountMeta::new(*taker_token_b, false),
            AccountMeta::new(ata(maker, mint_b), false),
            AccountMeta::new(offer, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(*token_program_id, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    })
}

pub fn cancel_offer(
    program_id: &Pubkey,
    maker: &Pubkey,
    mint_a: &Pubkey,
    token_program_id: &Pubkey,
    id: u64,
) -> Result<Instruction, ProgramError> {
    let (offer, _) = find_offer_address(program_id, maker, id);
    let vault = find_vault_address(program_id, maker, id, mint_a, token_program_id);
    let maker_token_a = spl_associated_token_account::get_associated_token_address_with_program_id(
        maker,
        mint_a,
        token_program_id,
    );

    Ok(Instruction {
        program_id: *program_id,
        data: EscrowInstruction::CancelOffer.pack()?,
        accounts: vec![
            AccountMeta::new(*maker, true),
            AccountMeta::new_readonly(*mint_a, false),
            AccountMeta::new(maker_token_a, false),
            AccountMeta::new(offer, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(*token_program_id, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    })
}
