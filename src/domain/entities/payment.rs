use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Payment methods accepted at checkout. Each method carries its own
/// gateway-enforced minimum charge, configured in `AppConfig`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentMethod {
    Pix,
    Boleto,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Boleto => "boleto",
            PaymentMethod::Card => "card",
        }
    }

    /// The gateway's payment_method_id for this method. Card payments carry
    /// the brand-specific id inside the card token, so only a family marker
    /// is sent here.
    pub fn gateway_method_id(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Boleto => "bolbradesco",
            PaymentMethod::Card => "credit_card",
        }
    }
}

/// Payment lifecycle states as reported by the gateway.
///
/// `pending → {approved | rejected | cancelled | expired}` with
/// `authorized`/`in_process`/`in_mediation` as intermediate states.
/// Unknown strings map to `Other` rather than failing deserialization:
/// the gateway adds statuses without notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    Expired,
    #[serde(other)]
    Other,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::InProcess => "in_process",
            PaymentStatus::InMediation => "in_mediation",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::ChargedBack => "charged_back",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Other => "other",
        }
    }

    /// Terminal states halt client-side polling and are never reused by
    /// the dedup layer.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Approved
                | PaymentStatus::Rejected
                | PaymentStatus::Cancelled
                | PaymentStatus::Refunded
                | PaymentStatus::ChargedBack
                | PaymentStatus::Expired
        )
    }

    /// States the cancellation guard is allowed to cancel from.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Pending
                | PaymentStatus::InProcess
                | PaymentStatus::Authorized
                | PaymentStatus::InMediation
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "approved" => Ok(PaymentStatus::Approved),
            "authorized" => Ok(PaymentStatus::Authorized),
            "in_process" => Ok(PaymentStatus::InProcess),
            "in_mediation" => Ok(PaymentStatus::InMediation),
            "rejected" => Ok(PaymentStatus::Rejected),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            "refunded" => Ok(PaymentStatus::Refunded),
            "charged_back" => Ok(PaymentStatus::ChargedBack),
            "expired" => Ok(PaymentStatus::Expired),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_halt_polling() {
        assert!(PaymentStatus::Approved.is_terminal());
        assert!(PaymentStatus::Rejected.is_terminal());
        assert!(PaymentStatus::Cancelled.is_terminal());
        assert!(PaymentStatus::Expired.is_terminal());
        assert!(PaymentStatus::Refunded.is_terminal());
        assert!(PaymentStatus::ChargedBack.is_terminal());

        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(!PaymentStatus::InProcess.is_terminal());
        assert!(!PaymentStatus::Authorized.is_terminal());
        assert!(!PaymentStatus::InMediation.is_terminal());
    }

    #[test]
    fn test_cancellable_set() {
        assert!(PaymentStatus::Pending.is_cancellable());
        assert!(PaymentStatus::InProcess.is_cancellable());
        assert!(PaymentStatus::Authorized.is_cancellable());
        assert!(PaymentStatus::InMediation.is_cancellable());

        assert!(!PaymentStatus::Approved.is_cancellable());
        assert!(!PaymentStatus::Rejected.is_cancellable());
        assert!(!PaymentStatus::Cancelled.is_cancellable());
        assert!(!PaymentStatus::Other.is_cancellable());
    }

    #[test]
    fn test_unknown_status_deserializes_to_other() {
        let status: PaymentStatus = serde_json::from_str("\"some_new_state\"").unwrap();
        assert_eq!(status, PaymentStatus::Other);
    }
}
