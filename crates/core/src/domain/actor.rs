use serde::{Deserialize, Serialize};

use crate::domain::request::Request;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    FieldOperator,
    RegionalHead,
    PaymentTeam,
    VendorCoordinator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldOperator => "FIELD_OPERATOR",
            Self::RegionalHead => "REGIONAL_HEAD",
            Self::PaymentTeam => "PAYMENT_TEAM",
            Self::VendorCoordinator => "VENDOR_COORDINATOR",
        }
    }
}

/// Identity supplied by the external identity collaborator. Trusted for
/// authorization decisions; no credential verification happens here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// The two roles that own an approval flag. Keeping this closed makes the
/// flag dispatch exhaustive instead of branching on a role string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewerRole {
    RegionalHead,
    PaymentTeam,
}

impl ReviewerRole {
    pub fn role(self) -> Role {
        match self {
            Self::RegionalHead => Role::RegionalHead,
            Self::PaymentTeam => Role::PaymentTeam,
        }
    }

    /// Short label used in audit actions ("RH Approved", "Payment Rejected").
    pub fn short_label(self) -> &'static str {
        match self {
            Self::RegionalHead => "RH",
            Self::PaymentTeam => "Payment",
        }
    }

    pub fn own_flag(self, request: &Request) -> bool {
        match self {
            Self::RegionalHead => request.rh_approval,
            Self::PaymentTeam => request.payment_approval,
        }
    }

    pub fn other_flag(self, request: &Request) -> bool {
        match self {
            Self::RegionalHead => request.payment_approval,
            Self::PaymentTeam => request.rh_approval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReviewerRole, Role};

    #[test]
    fn reviewer_roles_map_onto_their_actor_roles() {
        assert_eq!(ReviewerRole::RegionalHead.role(), Role::RegionalHead);
        assert_eq!(ReviewerRole::PaymentTeam.role(), Role::PaymentTeam);
    }

    #[test]
    fn role_wire_values_match_the_identity_collaborator() {
        let encoded = serde_json::to_string(&Role::VendorCoordinator).expect("encode");
        assert_eq!(encoded, "\"VENDOR_COORDINATOR\"");
        let decoded: Role = serde_json::from_str("\"FIELD_OPERATOR\"").expect("decode");
        assert_eq!(decoded, Role::FieldOperator);
    }
}
