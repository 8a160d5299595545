#![allow(dead_code)]

use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    native_token::LAMPORTS_PER_SOL,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    transaction::{Transaction, TransactionError},
};
use spl_token_2022::{
    extension::{transfer_fee, ExtensionType, StateWithExtensions},
    state::{Account as TokenAccount, Mint},
};

use swap_escrow::error::EscrowError;

pub const DECIMALS: u8 = 6;
pub const STARTING_TOKENS: u64 = 10_000_000;

/// A maker and a taker, each holding the token the other one wants.
pub struct EscrowTestEnvironment {
    pub context: ProgramTestContext,
    pub token_program: Pubkey,
    pub mint_authority: Keypair,
    pub maker: Keypair,
    pub taker: Keypair,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub maker_token_a: Pubkey,
    pub taker_token_b: Pubkey,
}

impl EscrowTestEnvironment {
    /// `wallet`'s associated account for `mint`, whether or not it exists yet.
    pub fn ata(&self, wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
        spl_associated_token_account::get_associated_token_address_with_program_id(
            wallet,
            mint,
            &self.token_program,
        )
    }

    pub fn make_offer_ix(&self, id: u64, offered_amount: u64, wanted_amount: u64) -> Instruction {
        swap_escrow::instruction::make_offer(
            &swap_escrow::id(),
            &self.maker.pubkey(),
            &self.mint_a,
            &self.mint_b,
            &self.maker_token_a,
            &self.token_program,
            id,
            offered_amount,
            wanted_amount,
        )
        .unwrap()
    }

    pub fn take_offer_ix(&self, taker: &Pubkey, taker_token_b: &Pubkey, id: u64) -> Instruction {
        swap_escrow::instruction::take_offer(
            &swap_escrow::id(),
            taker,
            &self.maker.pubkey(),
            &self.mint_a,
            &self.mint_b,
            taker_token_b,
            &self.token_program,
            id,
        )
        .unwrap()
    }

    pub fn cancel_offer_ix(&self, id: u64) -> Instruction {
        swap_escrow::instruction::cancel_offer(
            &swap_escrow::id(),
            &self.maker.pubkey(),
            &self.mint_a,
            &self.token_program,
            id,
        )
        .unwrap()
    }
}

pub async fn setup_escrow(token_program: Pubkey) -> EscrowTestEnvironment {
    let program_test = ProgramTest::new(
        "swap_escrow",
        swap_escrow::id(),
        processor!(swap_escrow::process_instruction),
    );
    let mut context = program_test.start_with_context().await;

    let mint_authority = Keypair::new();
    let maker = Keypair::new();
    let taker = Keypair::new();

    airdrop(&mut context, &maker.pubkey(), 10 * LAMPORTS_PER_SOL).await;
    airdrop(&mut context, &taker.pubkey(), 10 * LAMPORTS_PER_SOL).await;

    let mint_a = create_mint(&mut context, &token_program, &mint_authority).await;
    let mint_b = create_mint(&mut context, &token_program, &mint_authority).await;

    let maker_token_a =
        create_token_account(&mut context, &token_program, &maker.pubkey(), &mint_a).await;
    let taker_token_b =
        create_token_account(&mut context, &token_program, &taker.pubkey(), &mint_b).await;

    mint_tokens(
        &mut context,
        &token_program,
        &mint_a,
        &mint_authority,
        &maker_token_a,
        STARTING_TOKENS,
    )
    .await;
    mint_tokens(
        &mut context,
        &token_program,
        &mint_b,
        &mint_authority,
        &taker_token_b,
        STARTING_TOKENS,
    )
    .await;

    EscrowTestEnvironment {
        context,
        token_program,
        mint_authority,
        maker,
        taker,
        mint_a,
        mint_b,
        maker_token_a,
        taker_token_b,
    }
}

pub async fn airdrop(context: &mut ProgramTestContext, to: &Pubkey, lamports: u64) {
    let ix = system_instruction::transfer(&context.payer.pubkey(), to, lamports);
    let payer = context.payer.insecure_clone();
    send(context, &[ix], &[&payer]).await.unwrap();
}

pub async fn create_mint(
    context: &mut ProgramTestContext,
    token_program: &Pubkey,
    authority: &Keypair,
) -> Pubkey {
    let mint = Keypair::new();
    let rent = context.banks_client.get_rent().await.unwrap();
    let payer = context.payer.insecure_clone();

    let ixs = [
        system_instruction::create_account(
            &payer.pubkey(),
            &mint.pubkey(),
            rent.minimum_balance(Mint::LEN),
            Mint::LEN as u64,
            token_program,
        ),
        spl_token_2022::instruction::initialize_mint2(
            token_program,
            &mint.pubkey(),
            &authority.pubkey(),
            None,
            DECIMALS,
        )
        .unwrap(),
    ];
    send(context, &ixs, &[&payer, &mint]).await.unwrap();

    mint.pubkey()
}

/// Token-2022 mint that withholds `basis_points` of every transfer.
pub async fn create_fee_mint(
    context: &mut ProgramTestContext,
    authority: &Keypair,
    basis_points: u16,
) -> Pubkey {
    let mint = Keypair::new();
    let rent = context.banks_client.get_rent().await.unwrap();
    let payer = context.payer.insecure_clone();
    let space =
        ExtensionType::try_calculate_account_len::<Mint>(&[ExtensionType::TransferFeeConfig])
            .unwrap();

    let ixs = [
        system_instruction::create_account(
            &payer.pubkey(),
            &mint.pubkey(),
            rent.minimum_balance(space),
            space as u64,
            &spl_token_2022::id(),
        ),
        transfer_fee::instruction::initialize_transfer_fee_config(
            &spl_token_2022::id(),
            &mint.pubkey(),
            Some(&authority.pubkey()),
            Some(&authority.pubkey()),
            basis_points,
            u64::MAX,
        )
        .unwrap(),
        spl_token_2022::instruction::initialize_mint2(
            &spl_token_2022::id(),
            &mint.pubkey(),
            &authority.pubkey(),
            None,
            DECIMALS,
        )
        .unwrap(),
    ];
    send(context, &ixs, &[&payer, &mint]).await.unwrap();

    mint.pubkey()
}

pub async fn create_token_account(
    context: &mut ProgramTestContext,
    token_program: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Pubkey {
    let payer = context.payer.insecure_clone();
    let ix = spl_associated_token_account::instruction::create_associated_token_account(
        &payer.pubkey(),
        owner,
        mint,
        token_program,
    );
    send(context, &[ix], &[&payer]).await.unwrap();

    spl_associated_token_account::get_associated_token_address_with_program_id(
        owner,
        mint,
        token_program,
    )
}

pub async fn mint_tokens(
    context: &mut ProgramTestContext,
    token_program: &Pubkey,
    mint: &Pubkey,
    authority: &Keypair,
    destination: &Pubkey,
    amount: u64,
) {
    let payer = context.payer.insecure_clone();
    let ix = spl_token_2022::instruction::mint_to(
        token_program,
        mint,
        destination,
        &authority.pubkey(),
        &[],
        amount,
    )
    .unwrap();
    send(context, &[ix], &[&payer, authority]).await.unwrap();
}

/// Signs with `signers`, the first one paying the fee.
pub async fn send(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let blockhash = context.banks_client.get_latest_blockhash().await.unwrap();
    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&signers[0].pubkey()),
        signers,
        blockhash,
    );
    context.banks_client.process_transaction(tx).await
}

pub async fn token_balance(context: &mut ProgramTestContext, address: &Pubkey) -> u64 {
    let account = context
        .banks_client
        .get_account(*address)
        .await
        .unwrap()
        .expect("token account exists");
    StateWithExtensions::<TokenAccount>::unpack(&account.data)
        .unwrap()
        .base
        .amount
}

pub async fn lamports(context: &mut ProgramTestContext, address: &Pubkey) -> u64 {
    context
        .banks_client
        .get_account(*address)
        .await
        .unwrap()
        .map_or(0, |account| account.lamports)
}

pub async fn is_closed(context: &mut ProgramTestContext, address: &Pubkey) -> bool {
    context
        .banks_client
        .get_account(*address)
        .await
        .unwrap()
        .map_or(true, |account| account.lamports == 0)
}

pub fn random_offer_id() -> u64 {
    let bytes = Keypair::new().pubkey().to_bytes();
    u64::from_le_bytes(bytes[..8].try_into().unwrap())
}

pub fn assert_instruction_error(result: Result<(), BanksClientError>, expected: InstructionError) {
    let error = result.expect_err("transaction should fail").unwrap();
    assert_eq!(error, TransactionError::InstructionError(0, expected));
}

pub fn assert_escrow_error(result: Result<(), BanksClientError>, expected: EscrowError) {
    assert_instruction_error(result, InstructionError::Custom(expected as u32));
}
