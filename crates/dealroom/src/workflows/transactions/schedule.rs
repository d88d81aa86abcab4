use chrono::{DateTime, Duration, Utc};

use super::blueprint::ScheduleBlueprint;
use super::domain::{
    Activity, ActivityKind, Milestone, Payment, PaymentStatus, Transaction, TransactionDraft,
    TransactionStage,
};
use crate::workflows::ids::{MilestoneId, PaymentId, TransactionId};
use crate::workflows::listings::visibility::display_title;
use crate::workflows::listings::Listing;
use crate::workflows::loi::Loi;

/// Build the transaction, its milestones and payments for a signed letter of intent.
///
/// Pure: every due date derives from the single `now` passed in, and nothing is persisted.
pub fn generate(
    blueprint: &ScheduleBlueprint,
    loi: &Loi,
    listing: &Listing,
    now: DateTime<Utc>,
) -> TransactionDraft {
    let transaction_id = TransactionId::next();
    let agreed_price = loi.terms.proposed_price;

    let transaction = Transaction {
        id: transaction_id.clone(),
        listing_id: listing.id.clone(),
        buyer_id: loi.buyer_id.clone(),
        seller_id: listing.owner_id.clone(),
        advisor_id: None,
        loi_id: loi.id.clone(),
        agreed_price,
        stage: TransactionStage::LoiSigned,
        created_at: now,
        updated_at: now,
    };

    let milestones = blueprint
        .milestones()
        .iter()
        .enumerate()
        .map(|(position, template)| {
            let completed = template.offset_days == 0;
            Milestone {
                id: MilestoneId::next(),
                transaction_id: transaction_id.clone(),
                key: template.key.to_string(),
                title: template.title.to_string(),
                description: template.description.to_string(),
                due_date: now + Duration::days(template.offset_days),
                responsible: template.responsible,
                completed,
                completed_at: completed.then_some(now),
                position: position as u16,
            }
        })
        .collect();

    let payments = blueprint
        .payments()
        .iter()
        .zip(blueprint.split(agreed_price))
        .map(|(template, amount)| Payment {
            id: PaymentId::next(),
            transaction_id: transaction_id.clone(),
            kind: template.kind,
            amount,
            description: template.description.to_string(),
            due_date: now + Duration::days(template.offset_days),
            status: PaymentStatus::Pending,
        })
        .collect();

    let activity = Activity::record(
        &transaction_id,
        ActivityKind::TransactionCreated,
        &listing.owner_id,
        format!(
            "Letter of intent {} signed for {}; transaction opened at {}",
            loi.id,
            display_title(listing),
            agreed_price
        ),
        now,
    );

    TransactionDraft {
        transaction,
        milestones,
        payments,
        activity,
    }
}
