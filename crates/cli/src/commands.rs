//! CLI commands

use std::path::{Path, PathBuf};

use anyhow::Context;

use kycguard_compliance::{AuditEvent, RiskSummary, ScreeningOutcome, Submission};
use kycguard_core::{
    Alert, AlertId, AmlFinding, AuditLogEntry, DeviceFingerprint, DuplicateReport,
    KycDecision, ParsedDocument, UserProfile,
};
use kycguard_fraud::{Identifiers, ModelSignals};
use kycguard_store::IdKind;

use crate::context::AppContext;

/// Inputs of `kycguard screen`
#[derive(Debug, Clone)]
pub struct ScreenRequest {
    /// Document image
    pub image: PathBuf,
    /// Parsed fields as JSON (`ParsedDocument`)
    pub fields: PathBuf,
    /// Raw OCR text
    pub text: Option<PathBuf>,
    /// Device fingerprint as JSON
    pub device: Option<PathBuf>,
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub manipulation: Option<f64>,
    pub network_fraud: Option<f64>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, anyhow::Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Screen one document and print the outcome
pub async fn screen(ctx: &AppContext, req: ScreenRequest) -> Result<ScreeningOutcome, anyhow::Error> {
    let bytes = std::fs::read(&req.image)
        .with_context(|| format!("reading {}", req.image.display()))?;
    let parsed: ParsedDocument = read_json(&req.fields)?;
    let device: Option<DeviceFingerprint> = req
        .device
        .as_ref()
        .map(|path| read_json::<DeviceFingerprint>(path))
        .transpose()?;
    let raw_text = req
        .text
        .as_ref()
        .map(std::fs::read_to_string)
        .transpose()?;

    let models = (req.manipulation.is_some() || req.network_fraud.is_some()).then_some(
        ModelSignals {
            manipulation: req.manipulation,
            network_fraud: req.network_fraud,
        },
    );

    let mut user = UserProfile::new(req.user_id, req.email);
    user.name = req.name;

    let filename = req
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let outcome = ctx
        .pipeline
        .screen(Submission {
            user,
            filename,
            bytes,
            parsed,
            raw_text,
            device,
            models,
        })
        .await?;

    let icon = match outcome.decision {
        KycDecision::Pass => "✅",
        KycDecision::Review => "⚠️",
        KycDecision::Flagged => "🚩",
    };
    println!(
        "{} {} (score {}, {} risk) document {}",
        icon,
        outcome.decision.as_str(),
        outcome.fraud.score(),
        outcome.fraud.band(),
        outcome.document_id
    );
    for reason in outcome.fraud.reasons() {
        println!("   fraud: {}", reason);
    }
    for reason in &outcome.aml_reasons {
        println!("   aml:   {}", reason);
    }
    for alert in &outcome.alerts {
        println!("   alert {} ({})", alert.id, alert.risk_level);
    }
    Ok(outcome)
}

/// List alerts, unseen only unless `all`
pub fn alerts(ctx: &AppContext, all: bool) -> Result<Vec<Alert>, anyhow::Error> {
    let desk = ctx.pipeline.alerts();
    let alerts = if all { desk.all()? } else { desk.unseen()? };

    if alerts.is_empty() {
        println!("No alerts");
    }
    for alert in &alerts {
        println!(
            "{} {} [{}] {} {}: {}",
            if alert.seen { " " } else { "•" },
            alert.id,
            alert.risk_level,
            alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
            alert.user_email,
            alert.reason
        );
    }
    Ok(alerts)
}

/// Mark an alert seen
pub fn dismiss(ctx: &AppContext, alert_id: &str) -> Result<bool, anyhow::Error> {
    let id: AlertId = alert_id
        .parse()
        .with_context(|| format!("invalid alert id {}", alert_id))?;
    let dismissed = ctx.pipeline.alerts().dismiss(id)?;

    if dismissed {
        println!("✅ Alert {} dismissed", id);
    } else {
        println!("Alert {} was already dismissed", id);
    }
    Ok(dismissed)
}

/// Most recent audit entries
pub fn logs(ctx: &AppContext, limit: usize) -> Result<Vec<AuditLogEntry>, anyhow::Error> {
    let entries = ctx.pipeline.audit_logs(limit)?;
    for entry in &entries {
        println!("{}", serde_json::to_string(entry)?);
    }
    Ok(entries)
}

pub fn risk(ctx: &AppContext, aadhaar: &str) -> Result<RiskSummary, anyhow::Error> {
    let normalized = ParsedDocument::default().with_aadhaar(aadhaar);
    let key = normalized.aadhaar_number.as_deref().unwrap_or(aadhaar);
    let summary = ctx.pipeline.risk_summary(key)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(summary)
}

/// Blacklist lookup for a single Aadhaar
pub fn aml_check(ctx: &AppContext, aadhaar: &str) -> Result<AmlFinding, anyhow::Error> {
    let finding = ctx.pipeline.aml_check(aadhaar);
    match &finding.reason {
        Some(reason) if finding.flagged => println!("🚩 {}", reason),
        _ => println!("✅ Aadhaar not blacklisted"),
    }
    Ok(finding)
}

pub fn duplicates(
    ctx: &AppContext,
    aadhaar: Option<&str>,
    pan: Option<&str>,
    dl: Option<&str>,
) -> Result<DuplicateReport, anyhow::Error> {
    let mut doc = ParsedDocument::default();
    if let Some(aadhaar) = aadhaar {
        doc = doc.with_aadhaar(aadhaar);
    }
    if let Some(pan) = pan {
        doc = doc.with_pan(pan);
    }
    if let Some(dl) = dl {
        doc = doc.with_dl(dl);
    }

    let report = ctx.pipeline.lookup_duplicates(Identifiers::of(&doc));
    if report.is_duplicate() {
        let fields: Vec<&str> = report.matched.iter().map(|f| f.as_str()).collect();
        println!("⚠️  Already used: {}", fields.join(", "));
    } else {
        println!("✅ No duplicates");
    }
    Ok(report)
}

/// Add an identifier to the blacklist registry
pub fn blacklist_add(
    ctx: &AppContext,
    kind: IdKind,
    value: &str,
    reason: &str,
) -> Result<(), anyhow::Error> {
    ctx.registry.add(kind, value, reason)?;
    ctx.ledger()
        .append(&AuditEvent::blacklist_updated(kind, value, reason))?;

    println!("✅ {} {} added to blacklist", kind.label(), value);
    Ok(())
}
