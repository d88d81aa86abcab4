use super::domain::{PaymentKind, ResponsibleParty};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneTemplate {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub offset_days: i64,
    pub responsible: ResponsibleParty,
}

/// How a payment's amount is derived from the agreed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentShare {
    /// Floor of the given percentage of the price.
    Percent(u8),
    /// Whatever the earlier shares left over, so the schedule sums to the price.
    Remainder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTemplate {
    pub kind: PaymentKind,
    pub share: PaymentShare,
    pub offset_days: i64,
    pub description: &'static str,
}

/// Fixed deal schedule applied to every signed letter of intent.
#[derive(Debug)]
pub struct ScheduleBlueprint {
    milestones: Vec<MilestoneTemplate>,
    payments: Vec<PaymentTemplate>,
}

impl ScheduleBlueprint {
    pub fn standard() -> Self {
        Self {
            milestones: standard_milestones(),
            payments: standard_payments(),
        }
    }

    pub fn milestones(&self) -> &[MilestoneTemplate] {
        &self.milestones
    }

    pub fn payments(&self) -> &[PaymentTemplate] {
        &self.payments
    }

    /// Split `price` according to the payment templates. Amounts always sum to `price`.
    pub fn split(&self, price: u64) -> Vec<u64> {
        let mut allocated = 0u64;
        let mut amounts: Vec<Option<u64>> = self
            .payments
            .iter()
            .map(|template| match template.share {
                PaymentShare::Percent(percent) => {
                    let amount = price / 100 * u64::from(percent)
                        + price % 100 * u64::from(percent) / 100;
                    allocated += amount;
                    Some(amount)
                }
                PaymentShare::Remainder => None,
            })
            .collect();

        let remainder = price.saturating_sub(allocated);
        let mut remainder_taken = false;
        for amount in amounts.iter_mut().filter(|amount| amount.is_none()) {
            *amount = Some(if remainder_taken { 0 } else { remainder });
            remainder_taken = true;
        }

        amounts.into_iter().map(|amount| amount.unwrap_or(0)).collect()
    }
}

fn standard_milestones() -> Vec<MilestoneTemplate> {
    vec![
        MilestoneTemplate {
            key: "loi_signed",
            title: "LOI signed",
            description: "Letter of intent accepted by the seller.",
            offset_days: 0,
            responsible: ResponsibleParty::Both,
        },
        MilestoneTemplate {
            key: "nda_in_force",
            title: "NDA in force",
            description: "Confidentiality agreement countersigned for the transaction team.",
            offset_days: 2,
            responsible: ResponsibleParty::Both,
        },
        MilestoneTemplate {
            key: "dd_started",
            title: "Due diligence started",
            description: "Data room opened and the buyer's review has begun.",
            offset_days: 7,
            responsible: ResponsibleParty::Buyer,
        },
        MilestoneTemplate {
            key: "dd_report",
            title: "Due diligence report",
            description: "Findings from financial, legal and commercial review delivered.",
            offset_days: 35,
            responsible: ResponsibleParty::Buyer,
        },
        MilestoneTemplate {
            key: "spa_negotiation",
            title: "SPA negotiation",
            description: "Share purchase agreement drafted and negotiated.",
            offset_days: 40,
            responsible: ResponsibleParty::Both,
        },
        MilestoneTemplate {
            key: "spa_signed",
            title: "SPA signed",
            description: "Share purchase agreement signed by both parties.",
            offset_days: 60,
            responsible: ResponsibleParty::Both,
        },
        MilestoneTemplate {
            key: "payment_received",
            title: "Payment received",
            description: "Main payment received by the seller.",
            offset_days: 65,
            responsible: ResponsibleParty::Buyer,
        },
        MilestoneTemplate {
            key: "ownership_transferred",
            title: "Ownership transfer registered",
            description: "Change of ownership registered with the companies registry.",
            offset_days: 75,
            responsible: ResponsibleParty::Seller,
        },
        MilestoneTemplate {
            key: "deal_closed",
            title: "Deal closed",
            description: "Handover complete and the transaction closed.",
            offset_days: 90,
            responsible: ResponsibleParty::Both,
        },
    ]
}

fn standard_payments() -> Vec<PaymentTemplate> {
    vec![
        PaymentTemplate {
            kind: PaymentKind::Deposit,
            share: PaymentShare::Percent(10),
            offset_days: 5,
            description: "Deposit (10% of the agreed price)",
        },
        PaymentTemplate {
            kind: PaymentKind::MainPayment,
            share: PaymentShare::Remainder,
            offset_days: 65,
            description: "Main payment (remaining 90% of the agreed price)",
        },
    ]
}
