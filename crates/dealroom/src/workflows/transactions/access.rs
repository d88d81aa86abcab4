use super::domain::{TeamMember, TeamMemberStatus, Transaction, TransactionRole};
use crate::workflows::ids::PartyId;

/// Relationship of `actor` to `transaction`, resolved from stored records only.
///
/// Team members count once they have accepted their invitation.
pub fn resolve_role(
    transaction: &Transaction,
    team: &[TeamMember],
    actor: &PartyId,
) -> Option<TransactionRole> {
    if &transaction.seller_id == actor {
        return Some(TransactionRole::Seller);
    }
    if &transaction.buyer_id == actor {
        return Some(TransactionRole::Buyer);
    }
    if transaction.advisor_id.as_ref() == Some(actor) {
        return Some(TransactionRole::Advisor);
    }

    team.iter()
        .any(|member| {
            member.transaction_id == transaction.id
                && &member.party_id == actor
                && member.status == TeamMemberStatus::Accepted
        })
        .then_some(TransactionRole::TeamMember)
}
