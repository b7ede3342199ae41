//! User-facing notices for registration outcomes.

use crate::error::WalletError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    /// The notice to show for an `add_chain` outcome, if any.
    ///
    /// Rejections and ignored repeat clicks produce nothing.
    pub fn for_outcome(wallet_name: &str, result: &Result<(), WalletError>) -> Option<Self> {
        match result {
            Ok(()) => Some(Self::Success(format!("Chain added to {wallet_name}"))),
            Err(e) if e.should_surface() => Some(Self::Error(e.to_string())),
            Err(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_names_wallet() {
        assert_eq!(
            Notice::for_outcome("ethui", &Ok(())),
            Some(Notice::Success("Chain added to ethui".into()))
        );
    }

    #[test]
    fn rejection_and_pending_are_silent() {
        assert_eq!(
            Notice::for_outcome("ethui", &Err(WalletError::UserRejected)),
            None
        );
        assert_eq!(
            Notice::for_outcome(
                "ethui",
                &Err(WalletError::RequestPending {
                    wallet: "ethui".into()
                })
            ),
            None
        );
    }

    #[test]
    fn failures_carry_their_message() {
        let n = Notice::for_outcome(
            "ethui",
            &Err(WalletError::UnknownError {
                network: "dev".into(),
            }),
        )
        .unwrap();
        assert_eq!(n, Notice::Error("Failed to add dev to wallet".into()));
        assert_eq!(n.message(), "Failed to add dev to wallet");
    }
}
