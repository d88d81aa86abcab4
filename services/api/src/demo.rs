use crate::infra::{parse_date, DealServices};
use crate::routes::{schedule_preview, SchedulePreview};
use chrono::{Local, NaiveDate};
use clap::Args;
use dealroom::config::{DocumentConfig, LifecycleConfig};
use dealroom::error::AppError;
use dealroom::workflows::documents::{
    DocumentStatus, DocumentUpload, EncryptionKey, UploadPolicy,
};
use dealroom::workflows::identity::CallerContext;
use dealroom::workflows::listings::{
    BuyerPreferences, ConfidentialDetails, NewListing, RegionPreference,
};
use dealroom::workflows::loi::{LoiRevisionRequest, LoiTerms};
use dealroom::workflows::messaging::NewMessage;
use dealroom::workflows::nda::{NdaDecision, NewNdaRequest};

#[derive(Args, Debug)]
pub(crate) struct ScheduleArgs {
    /// Agreed purchase price in whole currency units
    #[arg(long)]
    pub(crate) price: u64,
    /// Date the letter of intent is signed (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Price the buyer opens with
    #[arg(long, default_value_t = 42_000_000)]
    pub(crate) opening_offer: u64,
    /// Price the seller counters with and finally signs
    #[arg(long, default_value_t = 46_000_000)]
    pub(crate) counter_offer: u64,
    /// Skip the document custody portion of the demo
    #[arg(long)]
    pub(crate) skip_documents: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            opening_offer: 42_000_000,
            counter_offer: 46_000_000,
            skip_documents: false,
        }
    }
}

pub(crate) fn run_schedule_preview(args: ScheduleArgs) -> Result<(), AppError> {
    let start = args.start.unwrap_or_else(|| Local::now().date_naive());
    let preview = schedule_preview(args.price, start)?;
    render_schedule(&preview);
    Ok(())
}

fn render_schedule(preview: &SchedulePreview) {
    println!(
        "Deal schedule for {} (signed {})",
        format_amount(preview.agreed_price),
        preview.start
    );
    println!("\nMilestones");
    for milestone in &preview.milestones {
        println!(
            "  {}  {:<34} {:?}",
            milestone.due_date, milestone.title, milestone.responsible
        );
    }
    println!("\nPayments");
    for payment in &preview.payments {
        println!(
            "  {}  {:>16}  {}",
            payment.due_date,
            format_amount(payment.amount),
            payment.description
        );
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let policy = UploadPolicy::default();
    let documents = DocumentConfig {
        encryption_key: EncryptionKey::generate(),
        ephemeral_key: true,
        max_upload_bytes: policy.max_bytes,
        storage_timeout: policy.storage_timeout,
    };
    let services = DealServices::in_memory(&LifecycleConfig::default(), &documents);

    let seller = CallerContext::new("seller-demo");
    let buyer = CallerContext::new("buyer-demo");

    println!("Deal room demo");

    let listing = services.listings.create(
        &seller,
        NewListing {
            confidential: ConfidentialDetails {
                company_name: Some("Nordkod Konsult AB".to_string()),
                registry_number: Some("556000-0000".to_string()),
                ..ConfidentialDetails::default()
            },
            business_type: Some("it_consulting".to_string()),
            region: Some("Stockholm".to_string()),
            industry: Some("IT".to_string()),
            description: Some("Profitable consultancy with long-term public sector clients.".to_string()),
            price_min: Some(40_000_000),
            price_max: Some(60_000_000),
            revenue: Some(30_000_000),
            employees: Some(24),
            publish: true,
            ..NewListing::default()
        },
    )?;
    println!("\n1. Listing {} published", listing.id);

    services.listings.save_profile(
        &buyer,
        BuyerPreferences {
            preferred_regions: RegionPreference::Only(vec!["Stockholm".to_string()]),
            preferred_industries: vec!["IT".to_string()],
            price_min: Some(30_000_000),
            price_max: Some(70_000_000),
            revenue_min: None,
            revenue_max: None,
        },
    )?;
    let notified = services.listings.notify_matching_buyers(&listing.id)?;
    let anonymous = services.listings.get(Some(&buyer), &listing.id)?;
    println!(
        "   buyer sees \"{}\" (match score {}, company name hidden: {}); {} buyer(s) notified",
        anonymous.title,
        anonymous
            .match_score
            .map(|score| score.to_string())
            .unwrap_or_else(|| "-".to_string()),
        anonymous.company_name.is_none(),
        notified
    );

    let request = services.nda.request(
        &buyer,
        &listing.id,
        NewNdaRequest {
            message: Some("Strategic acquirer in the Nordics.".to_string()),
        },
    )?;
    services.nda.decide(&seller, &request.id, NdaDecision::Approve)?;
    let signed = services.nda.sign(&buyer, &request.id)?;
    let disclosed = services.listings.get(Some(&buyer), &listing.id)?;
    println!(
        "\n2. NDA {} {}; buyer now sees company \"{}\"",
        signed.id,
        signed.status.label(),
        disclosed.company_name.as_deref().unwrap_or("?")
    );

    services.messaging.send(
        &buyer,
        &listing.id,
        NewMessage {
            recipient_id: seller.actor_id.to_string(),
            body: "Could we see the last three annual reports?".to_string(),
        },
    )?;
    println!("   buyer messaged the seller");

    let offer = services.loi.propose(
        &buyer,
        &listing.id,
        LoiTerms {
            proposed_price: args.opening_offer,
            cash_at_closing_pct: Some(80),
            escrow_holdback_pct: Some(10),
            escrow_period_months: Some(18),
            ..LoiTerms::default()
        },
    )?;
    let countered = services.loi.revise(
        &seller,
        &offer.loi.id,
        LoiRevisionRequest {
            change_description: "Seller counter-offer".to_string(),
            terms: Some(LoiTerms {
                proposed_price: args.counter_offer,
                ..offer.loi.terms.clone()
            }),
        },
    )?;
    println!(
        "\n3. LOI {} opened at {}, countered at {} (status {})",
        offer.loi.id,
        format_amount(args.opening_offer),
        format_amount(args.counter_offer),
        countered.display_status.label()
    );

    let approval = services.loi.approve(&seller, &offer.loi.id)?;
    let transaction_id = approval.transaction.transaction.id.clone();
    println!(
        "\n4. Transaction {} opened at stage {}",
        transaction_id,
        approval.transaction.transaction.stage.label()
    );
    for payment in &approval.transaction.payments {
        println!(
            "   {:?} {:>16} due {}",
            payment.kind,
            format_amount(payment.amount),
            payment.due_date.date_naive()
        );
    }

    if let Some(next) = approval
        .transaction
        .milestones
        .iter()
        .find(|milestone| !milestone.completed)
    {
        let done = services
            .transactions
            .complete_milestone(&seller, &transaction_id, &next.id)?;
        println!("   milestone \"{}\" completed", done.title);
    }
    let advanced = services
        .transactions
        .advance_stage(&buyer, &transaction_id, None)?;
    println!("   stage advanced to {}", advanced.stage.label());

    if !args.skip_documents {
        let meta = services
            .documents
            .upload(
                &seller,
                &transaction_id,
                DocumentUpload {
                    title: Some("Annual report 2024".to_string()),
                    filename: "annual-report-2024.pdf".to_string(),
                    media_type: "application/pdf".to_string(),
                    status: DocumentStatus::Final,
                    bytes: b"%PDF-1.7 demo annual report".to_vec(),
                },
            )
            .await?;
        let downloaded = services
            .documents
            .download(&buyer, &transaction_id, &meta.id)
            .await?;
        println!(
            "\n5. Document \"{}\" sealed and read back ({} bytes)",
            meta.title,
            downloaded.bytes.len()
        );
        for entry in services.documents.access_log(&seller, &transaction_id)? {
            println!(
                "   {} {} by {}",
                entry.created_at.format("%H:%M:%S"),
                entry.action.label(),
                entry.actor_id
            );
        }
    }

    println!("\nActivity");
    for activity in services.transactions.activity(&seller, &transaction_id)? {
        println!("  - {}", activity.description);
    }

    Ok(())
}

fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }
    format!("{grouped} SEK")
}
