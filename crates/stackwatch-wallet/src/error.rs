//! Outcome taxonomy for wallet requests.

use serde_json::Value;
use thiserror::Error;

/// EIP-1193 code for "the user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The user declined in the wallet. An expected outcome, not a fault.
    #[error("Request rejected by user")]
    UserRejected,

    /// The wallet reported a failure with a code and/or message.
    #[error("{message}")]
    ProviderError { code: Option<i64>, message: String },

    /// The wallet failed with something that is not a provider error object.
    #[error("Failed to add {network} to wallet")]
    UnknownError { network: String },

    /// A request to the same wallet is still waiting for the user.
    #[error("A request to {wallet} is already pending")]
    RequestPending { wallet: String },
}

impl WalletError {
    /// Turn whatever a provider threw into a [`WalletError`].
    ///
    /// - numeric `code` 4001 → [`UserRejected`](Self::UserRejected)
    /// - any other numeric `code` or string `message` →
    ///   [`ProviderError`](Self::ProviderError)
    /// - anything else → [`UnknownError`](Self::UnknownError) naming `network`
    pub fn classify(fault: &Value, network: &str) -> Self {
        let code = fault.get("code").and_then(integer_code);
        let message = fault
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty());

        match (code, message) {
            (Some(USER_REJECTED_CODE), _) => Self::UserRejected,
            (code, Some(message)) => Self::ProviderError {
                code,
                message: message.to_string(),
            },
            (Some(code), None) => Self::ProviderError {
                code: Some(code),
                message: format!("Wallet returned error code {code}"),
            },
            (None, None) => Self::UnknownError {
                network: network.to_string(),
            },
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected)
    }

    /// Whether this outcome should be shown to the user as an error.
    ///
    /// Rejections are the user's own choice and repeat clicks are ignored, so
    /// neither is surfaced.
    pub fn should_surface(&self) -> bool {
        matches!(self, Self::ProviderError { .. } | Self::UnknownError { .. })
    }
}

/// JS wallets may encode codes as floats (`4001.0`); only whole numbers count.
fn integer_code(code: &Value) -> Option<i64> {
    code.as_i64().or_else(|| {
        let f = code.as_f64()?;
        (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then(|| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn float_encoded_rejection_is_still_a_rejection() {
        assert_eq!(
            WalletError::classify(&json!({"code": 4001.0, "message": "User denied"}), "dev"),
            WalletError::UserRejected
        );
        assert_eq!(
            WalletError::classify(&json!({"code": 4001.5}), "dev"),
            WalletError::UnknownError {
                network: "dev".into()
            }
        );
    }

    #[test]
    fn code_4001_is_user_rejection_regardless_of_message() {
        for fault in [
            json!({"code": 4001}),
            json!({"code": 4001, "message": "User rejected the request."}),
        ] {
            let e = WalletError::classify(&fault, "dev");
            assert_eq!(e, WalletError::UserRejected);
            assert!(!e.should_surface());
        }
    }

    #[test]
    fn other_codes_are_provider_errors_with_message() {
        let e = WalletError::classify(
            &json!({"code": -32602, "message": "Invalid chainId"}),
            "dev",
        );
        assert_eq!(
            e,
            WalletError::ProviderError {
                code: Some(-32602),
                message: "Invalid chainId".into()
            }
        );
        assert!(e.should_surface());
        assert_eq!(e.to_string(), "Invalid chainId");
    }

    #[test]
    fn message_without_code_is_provider_error() {
        let e = WalletError::classify(&json!({"message": "Chain already exists"}), "dev");
        assert!(matches!(e, WalletError::ProviderError { code: None, .. }));
    }

    #[test]
    fn non_conforming_shapes_collapse_to_unknown() {
        for fault in [
            json!("boom"),
            json!(null),
            json!(42),
            json!({"code": "4001"}),
            json!({"reason": "nope"}),
        ] {
            let e = WalletError::classify(&fault, "dev-mainnet");
            assert_eq!(
                e,
                WalletError::UnknownError {
                    network: "dev-mainnet".into()
                },
                "fault {fault}"
            );
            assert_eq!(e.to_string(), "Failed to add dev-mainnet to wallet");
        }
    }
}
