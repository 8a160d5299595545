use borsh::BorshDeserialize;

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::{
    error::EscrowError,
    instruction::EscrowInstruction,
    state::{Offer, OFFER_SEED},
    token::{token_interface, TokenAccountState, TokenInterface},
};

pub fn process(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = EscrowInstruction::try_from_slice(instruction_data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    match instruction {
        EscrowInstruction::MakeOffer {
            id,
            offered_amount,
            wanted_amount,
        } => {
            msg!("Instruction: MakeOffer");
            make_offer(program_id, accounts, id, offered_amount, wanted_amount)
        }
        EscrowInstruction::TakeOffer => {
            msg!("Instruction: TakeOffer");
            take_offer(program_id, accounts)
        }
        EscrowInstruction::CancelOffer => {
            msg!("Instruction: CancelOffer");
            cancel_offer(program_id, accounts)
        }
    }
}

pub fn make_offer(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    id: u64,
    offered_amount: u64,
    wanted_amount: u64,
) -> ProgramResult {
    if offered_amount == 0 || wanted_amount == 0 {
        return Err(EscrowError::InvalidAmount.into());
    }

    let accs = &mut accounts.iter();

    let maker = next_account_info(accs)?;
    let mint_a = next_account_info(accs)?;
    let mint_b = next_account_info(accs)?;
    let maker_token_a = next_account_info(accs)?;
    let offer_info = next_account_info(accs)?;
    let vault = next_account_info(accs)?;
    let token_program = next_account_info(accs)?;
    let associated_token_program = next_account_info(accs)?;
    let system_program = next_account_info(accs)?;

    if !maker.is_signer {
        return Err(EscrowError::Unauthorized.into());
    }
    check_program_accounts(associated_token_program, system_program)?;
    let token = token_interface(token_program.key)?;

    if mint_a.key == mint_b.key {
        return Err(EscrowError::SameMint.into());
    }
    check_mint(token, mint_a)?;
    check_mint(token, mint_b)?;

    let source = load_token_account(token, maker_token_a)?;
    if source.mint != *mint_a.key {
        return Err(EscrowError::MintMismatch.into());
    }
    if source.owner != *maker.key {
        return Err(EscrowError::Unauthorized.into());
    }
    if source.amount < offered_amount {
        return Err(EscrowError::InsufficientBalance.into());
    }

    let id_bytes = id.to_le_bytes();
    let (offer_key, bump) =
        Pubkey::find_program_address(&Offer::seeds(maker.key, &id_bytes), program_id);
    if offer_key != *offer_info.key {
        return Err(ProgramError::InvalidSeeds);
    }
    if offer_info.lamports() != 0 || !offer_info.data_is_empty() {
        return Err(EscrowError::DuplicateOffer.into());
    }
    check_associated_address(token, vault, offer_info.key, mint_a.key)?;

    let rent = Rent::get()?;
    let bump_seed = [bump];
    let signer_seeds: &[&[u8]] = &[OFFER_SEED, maker.key.as_ref(), &id_bytes, &bump_seed];

    invoke_signed(
        &system_instruction::create_account(
            maker.key,
            offer_info.key,
            rent.minimum_balance(Offer::LEN),
            Offer::LEN as u64,
            program_id,
        ),
        &[maker.clone(), offer_info.clone(), system_program.clone()],
        &[signer_seeds],
    )?;

    invoke(
        &token.create_associated_account(maker.key, offer_info.key, mint_a.key),
        &[
            maker.clone(),
            vault.clone(),
            offer_info.clone(),
            mint_a.clone(),
            system_program.clone(),
            token_program.clone(),
            associated_token_program.clone(),
        ],
    )?;

    // The vault address is public, so it may have been created (and funded)
    // before the offer existed.
    if load_token_account(token, vault)?.amount != 0 {
        return Err(EscrowError::DuplicateOffer.into());
    }

    let decimals = token.mint_decimals(&mint_a.data.borrow())?;
    invoke(
        &token.transfer_checked(
            maker_token_a.key,
            mint_a.key,
            vault.key,
            maker.key,
            offered_amount,
            decimals,
        )?,
        &[
            maker_token_a.clone(),
            mint_a.clone(),
            vault.clone(),
            maker.clone(),
            token_program.clone(),
        ],
    )?;

    if load_token_account(token, vault)?.amount != offered_amount {
        return Err(EscrowError::VaultBalanceMismatch.into());
    }

    let offer = Offer {
        is_initialized: true,
        id,
        maker: *maker.key,
        mint_a: *mint_a.key,
        mint_b: *mint_b.key,
        wanted_amount,
        bump,
    };
    Offer::pack(offer, &mut offer_info.data.borrow_mut())?;

    msg!(
        "Offer {} made: {} of {} deposited for {} of {}",
        id,
        offered_amount,
        mint_a.key,
        wanted_amount,
        mint_b.key
    );
    Ok(())
}

pub fn take_offer(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let accs = &mut accounts.iter();

    let taker = next_account_info(accs)?;
    let maker = next_account_info(accs)?;
    let mint_a = next_account_info(accs)?;
    let mint_b = next_account_info(accs)?;
    let taker_token_a = next_account_info(accs)?;
    let taker_token_b = next_account_info(accs)?;
    let maker_token_b = next_account_info(accs)?;
    let offer_info = next_account_info(accs)?;
    let vault = next_account_info(accs)?;
    let token_program = next_account_info(accs)?;
    let associated_token_program = next_account_info(accs)?;
    let system_program = next_account_info(accs)?;

    if !taker.is_signer {
        return Err(EscrowError::Unauthorized.into());
    }
    check_program_accounts(associated_token_program, system_program)?;
    let token = token_interface(token_program.key)?;

    let offer = Offer::load(program_id, offer_info)?;
    if offer.maker != *maker.key {
        return Err(EscrowError::MakerMismatch.into());
    }
    if offer.mint_a != *mint_a.key || offer.mint_b != *mint_b.key {
        return Err(EscrowError::MintMismatch.into());
    }
    check_mint(token, mint_a)?;
    check_mint(token, mint_b)?;
    check_associated_address(token, vault, offer_info.key, mint_a.key)?;

    let source = load_token_account(token, taker_token_b)?;
    if source.mint != offer.mint_b {
        return Err(EscrowError::MintMismatch.into());
    }
    if source.owner != *taker.key {
        return Err(EscrowError::Unauthorized.into());
    }
    if source.amount < offer.wanted_amount {
        return Err(EscrowError::InsufficientBalance.into());
    }

    let programs = [
        system_program.clone(),
        token_program.clone(),
        associated_token_program.clone(),
    ];
    prepare_receiving_account(token, taker, taker_token_a, taker, mint_a, &programs)?;
    prepare_receiving_account(token, taker, maker_token_b, maker, mint_b, &programs)?;

    // Paying into the account the payment comes from moves nothing.
    let expected_b = if maker_token_b.key == taker_token_b.key {
        0
    } else {
        offer.wanted_amount
    };
    let maker_b_before = load_token_account(token, maker_token_b)?.amount;

    let decimals_b = token.mint_decimals(&mint_b.data.borrow())?;
    invoke(
        &token.transfer_checked(
            taker_token_b.key,
            mint_b.key,
            maker_token_b.key,
            taker.key,
            offer.wanted_amount,
            decimals_b,
        )?,
        &[
            taker_token_b.clone(),
            mint_b.clone(),
            maker_token_b.clone(),
            taker.clone(),
            token_program.clone(),
        ],
    )?;
    check_received(token, maker_token_b, maker_b_before, expected_b)?;

    let released = release_vault(
        token,
        &offer,
        offer_info,
        vault,
        mint_a,
        taker_token_a,
        maker,
        token_program,
    )?;
    close_offer(offer_info, maker)?;

    msg!(
        "Offer {} taken: {} of {} released for {} of {}",
        offer.id,
        released,
        offer.mint_a,
        offer.wanted_amount,
        offer.mint_b
    );
    Ok(())
}

pub fn cancel_offer(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let accs = &mut accounts.iter();

    let maker = next_account_info(accs)?;
    let mint_a = next_account_info(accs)?;
    let maker_token_a = next_account_info(accs)?;
    let offer_info = next_account_info(accs)?;
    let vault = next_account_info(accs)?;
    let token_program = next_account_info(accs)?;
    let associated_token_program = next_account_info(accs)?;
    let system_program = next_account_info(accs)?;

    if !maker.is_signer {
        return Err(EscrowError::Unauthorized.into());
    }
    check_program_accounts(associated_token_program, system_program)?;
    let token = token_interface(token_program.key)?;

    let offer = Offer::load(program_id, offer_info)?;
    if offer.maker != *maker.key {
        return Err(EscrowError::Unauthorized.into());
    }
    if offer.mint_a != *mint_a.key {
        return Err(EscrowError::MintMismatch.into());
    }
    check_mint(token, mint_a)?;
    check_associated_address(token, vault, offer_info.key, mint_a.key)?;

    let programs = [
        system_program.clone(),
        token_program.clone(),
        associated_token_program.clone(),
    ];
    prepare_receiving_account(token, maker, maker_token_a, maker, mint_a, &programs)?;

    let refunded = release_vault(
        token,
        &offer,
        offer_info,
        vault,
        mint_a,
        maker_token_a,
        maker,
        token_program,
    )?;
    close_offer(offer_info, maker)?;

    msg!(
        "Offer {} cancelled: {} of {} refunded",
        offer.id,
        refunded,
        offer.mint_a
    );
    Ok(())
}

fn check_program_accounts(
    associated_token_program: &AccountInfo,
    system_program: &AccountInfo,
) -> ProgramResult {
    if associated_token_program.key != &spl_associated_token_account::id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    if system_program.key != &system_program::id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

fn check_mint(token: &dyn TokenInterface, mint: &AccountInfo) -> ProgramResult {
    if *mint.owner != token.program_id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    token.mint_decimals(&mint.data.borrow())?;
    Ok(())
}

fn check_associated_address(
    token: &dyn TokenInterface,
    account: &AccountInfo,
    wallet: &Pubkey,
    mint: &Pubkey,
) -> ProgramResult {
    if token.associated_address(wallet, mint) != *account.key {
        return Err(EscrowError::InvalidTokenAccount.into());
    }
    Ok(())
}

fn load_token_account(
    token: &dyn TokenInterface,
    account: &AccountInfo,
) -> Result<TokenAccountState, ProgramError> {
    if *account.owner != token.program_id() {
        return Err(EscrowError::InvalidTokenAccount.into());
    }
    token.unpack_account(&account.data.borrow())
}

/// Makes sure `account` can receive `mint` on behalf of `owner`. An existing
/// account is accepted if it holds the right mint for the right owner, a
/// missing one must be the associated address and is created by `payer`.
fn prepare_receiving_account<'a>(
    token: &dyn TokenInterface,
    payer: &AccountInfo<'a>,
    account: &AccountInfo<'a>,
    owner: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    programs: &[AccountInfo<'a>; 3],
) -> ProgramResult {
    if !account.data_is_empty() {
        let state = load_token_account(token, account)?;
        if state.mint != *mint.key {
            return Err(EscrowError::MintMismatch.into());
        }
        if state.owner != *owner.key {
            return Err(EscrowError::InvalidTokenAccount.into());
        }
        return Ok(());
    }

    check_associated_address(token, account, owner.key, mint.key)?;

    let [system_program, token_program, associated_token_program] = programs;
    invoke(
        &token.create_associated_account(payer.key, owner.key, mint.key),
        &[
            payer.clone(),
            account.clone(),
            owner.clone(),
            mint.clone(),
            system_program.clone(),
            token_program.clone(),
            associated_token_program.clone(),
        ],
    )
}

/// Fails unless `account` gained exactly `expected` since it held `before`.
/// Fee-bearing mints deliver less than the transferred amount.
fn check_received(
    token: &dyn TokenInterface,
    account: &AccountInfo,
    before: u64,
    expected: u64,
) -> ProgramResult {
    let after = load_token_account(token, account)?.amount;
    if after.checked_sub(before) != Some(expected) {
        return Err(EscrowError::SettlementMismatch.into());
    }
    Ok(())
}

/// Sends the whole vault balance to `destination` and closes the vault,
/// refunding its rent to `rent_receiver`. Returns the amount released.
#[allow(clippy::too_many_arguments)]
fn release_vault<'a>(
    token: &dyn TokenInterface,
    offer: &Offer,
    offer_info: &AccountInfo<'a>,
    vault: &AccountInfo<'a>,
    mint_a: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    rent_receiver: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
) -> Result<u64, ProgramError> {
    let amount = load_token_account(token, vault)?.amount;
    let destination_before = load_token_account(token, destination)?.amount;
    let decimals = token.mint_decimals(&mint_a.data.borrow())?;

    let id_bytes = offer.id.to_le_bytes();
    let bump_seed = [offer.bump];
    let signer_seeds: &[&[u8]] = &[OFFER_SEED, offer.maker.as_ref(), &id_bytes, &bump_seed];

    invoke_signed(
        &token.transfer_checked(
            vault.key,
            mint_a.key,
            destination.key,
            offer_info.key,
            amount,
            decimals,
        )?,
        &[
            vault.clone(),
            mint_a.clone(),
            destination.clone(),
            offer_info.clone(),
            token_program.clone(),
        ],
        &[signer_seeds],
    )?;
    check_received(token, destination, destination_before, amount)?;

    invoke_signed(
        &token.close_account(vault.key, rent_receiver.key, offer_info.key)?,
        &[
            vault.clone(),
            rent_receiver.clone(),
            offer_info.clone(),
            token_program.clone(),
        ],
        &[signer_seeds],
    )?;

    Ok(amount)
}

/// Drains the record's lamports into `rent_receiver` and wipes its data, so
/// later lookups see no offer.
fn close_offer(offer_info: &AccountInfo, rent_receiver: &AccountInfo) -> ProgramResult {
    let refund = offer_info.lamports();
    let balance = rent_receiver
        .lamports()
        .checked_add(refund)
        .ok_or(ProgramError::ArithmeticOverflow)?;

    **rent_receiver.try_borrow_mut_lamports()? = balance;
    **offer_info.try_borrow_mut_lamports()? = 0;
    offer_info.data.borrow_mut().fill(0);

    Ok(())
}
