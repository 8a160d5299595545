use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    account_info::AccountInfo,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::error::EscrowError;

pub const OFFER_SEED: &[u8] = b"offer";

/// A pending swap: the maker's deposit of `mint_a` sits in the vault until
/// someone pays `wanted_amount` of `mint_b` for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Offer {
    pub is_initialized: bool,
    pub id: u64,
    pub maker: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub wanted_amount: u64,
    pub bump: u8,
}

impl Offer {
    /// Seeds of the offer PDA, without the bump.
    pub fn seeds<'a>(maker: &'a Pubkey, id_bytes: &'a [u8; 8]) -> [&'a [u8]; 3] {
        [OFFER_SEED, maker.as_ref(), &id_bytes[..]]
    }

    /// Loads the record behind `offer_info`. Anything that is not a live
    /// record owned by this program counts as a missing offer.
    pub fn load(program_id: &Pubkey, offer_info: &AccountInfo) -> Result<Self, ProgramError> {
        if offer_info.owner != program_id || offer_info.data_len() != Self::LEN {
            return Err(EscrowError::OfferNotFound.into());
        }

        let offer = Self::unpack_unchecked(&offer_info.data.borrow())?;
        if !offer.is_initialized {
            return Err(EscrowError::OfferNotFound.into());
        }

        let expected = Pubkey::create_program_address(
            &[
                OFFER_SEED,
                offer.maker.as_ref(),
                &offer.id.to_le_bytes(),
                &[offer.bump],
            ],
            program_id,
        )
        .map_err(|_| ProgramError::InvalidSeeds)?;
        if expected != *offer_info.key {
            return Err(ProgramError::InvalidSeeds);
        }

        Ok(offer)
    }
}

impl Sealed for Offer {}

impl IsInitialized for Offer {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Offer {
    const LEN: usize = 1 + 8 + 32 + 32 + 32 + 8 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Offer::LEN];
        let (is_initialized, id, maker, mint_a, mint_b, wanted_amount, bump) =
            array_refs![src, 1, 8, 32, 32, 32, 8, 1];

        let is_initialized = match is_initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(Offer {
            is_initialized,
            id: u64::from_le_bytes(*id),
            maker: Pubkey::new_from_array(*maker),
            mint_a: Pubkey::new_from_array(*mint_a),
            mint_b: Pubkey::new_from_array(*mint_b),
            wanted_amount: u64::from_le_bytes(*wanted_amount),
            bump: bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Offer::LEN];
        let (is_initialized_dst, id_dst, maker_dst, mint_a_dst, mint_b_dst, wanted_dst, bump_dst) =
            mut_array_refs![dst, 1, 8, 32, 32, 32, 8, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        *id_dst = self.id.to_le_bytes();
        maker_dst.copy_from_slice(self.maker.as_ref());
        mint_a_dst.copy_from_slice(self.mint_a.as_ref());
        mint_b_dst.copy_from_slice(self.mint_b.as_ref());
        *wanted_dst = self.wanted_amount.to_le_bytes();
        bump_dst[0] = self.bump;
    }
}

/// Address of the record for (`maker`, `id`) and its canonical bump.
pub fn find_offer_address(program_id: &Pubkey, maker: &Pubkey, id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&Offer::seeds(maker, &id.to_le_bytes()), program_id)
}

/// Vault holding the deposit for (`maker`, `id`): the offer PDA's associated
/// account for `mint_a` under `token_program_id`.
pub fn find_vault_address(
    program_id: &Pubkey,
    maker: &Pubkey,
    id: u64,
    mint_a: &Pubkey,
    token_program_id: &Pubkey,
) -> Pubkey {
    let (offer, _) = find_offer_address(program_id, maker, id);
    spl_associated_token_account::get_associated_token_address_with_program_id(
        &offer,
        mint_a,
        token_program_id,
    )
}
