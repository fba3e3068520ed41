use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Account data too short: {0} bytes")]
    AccountTooShort(usize),

    #[error("Account discriminator mismatch")]
    DiscriminatorMismatch,

    #[error("Invalid UTF-8 in account string field")]
    InvalidString,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid goods size: {0}")]
    InvalidGoodsSize(u8),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_account_too_short() {
        let err = CoreError::AccountTooShort(5);
        assert_eq!(err.to_string(), "Account data too short: 5 bytes");
    }

    #[test]
    fn test_error_display_discriminator_mismatch() {
        let err = CoreError::DiscriminatorMismatch;
        assert_eq!(err.to_string(), "Account discriminator mismatch");
    }

    #[test]
    fn test_error_display_invalid_goods_size() {
        let err = CoreError::InvalidGoodsSize(9);
        assert_eq!(err.to_string(), "Invalid goods size: 9");
    }
}
