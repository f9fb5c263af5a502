//! End-to-end tests: upload, extraction, folders and reminders.

use std::cell::RefCell;
use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use folio_core::expiration::ExpirationSweep;
use folio_core::ledger::{self, Ingestor, NewInvoice, RecordQuery};
use folio_core::models::config::{ExpirationConfig, UploadConfig};
use folio_core::notify::{self, NotificationTransport};
use folio_core::pdf::PlainTextSource;
use folio_core::store::{MemoryBlobStore, MemoryStore, RecordStore};
use folio_core::{InvoiceExtractor, NotificationPayload, PaymentStatus, RecordId, RuleBasedParser, Tier};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

const ENEL: &str = "ENEL DISTRIBUCION CHILE S.A. R.U.T.: 96.800.570-7
FACTURA ELECTRONICA N° 88123
Fecha Emisión: 02/09/2024
MONTO NETO $ 84.034
I.V.A. 19% $ 15.966
TOTAL $ 100.000";

const AGUAS: &str = "AGUAS ANDINAS S.A. R.U.T.: 61.808.000-5
FACTURA ELECTRONICA N° 5521
Fecha Emisión: 5 de setiembre de 2024
NETO 42.017
IVA 7.983
TOTAL A PAGAR 50.000";

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 10, 9, 0, 0).unwrap()
}

#[derive(Default)]
struct Recording {
    sent: RefCell<Vec<NotificationPayload>>,
}

impl NotificationTransport for Recording {
    fn deliver(&self, payload: &NotificationPayload) -> notify::Result<()> {
        self.sent.borrow_mut().push(payload.clone());
        Ok(())
    }
}

fn pdf_bytes(text: &str) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.extend_from_slice(text.as_bytes());
    data
}

fn seeded() -> (MemoryStore, MemoryBlobStore) {
    let ingestor = Ingestor::new(PlainTextSource, UploadConfig::default());
    let mut store = MemoryStore::new();
    let mut blobs = MemoryBlobStore::new();

    for (i, (title, text)) in [("Luz", ENEL), ("Agua", AGUAS), ("Luz", ENEL)].into_iter().enumerate() {
        ingestor
            .ingest(
                &mut store,
                &mut blobs,
                NewInvoice {
                    title: title.to_string(),
                    file_name: Some(format!("{}.pdf", title)),
                    data: pdf_bytes(text),
                    uploaded_by: Some("ana@example.com".to_string()),
                    folder_name: None,
                },
                t0() + Duration::minutes(i as i64),
            )
            .unwrap();
    }
    (store, blobs)
}

#[test]
fn test_upload_extracts_fields() {
    let (store, _) = seeded();
    let agua = store.get(RecordId(2)).unwrap();

    assert_eq!(agua.fields.folio.as_deref(), Some("5521"));
    assert_eq!(agua.fields.issue_date, NaiveDate::from_ymd_opt(2024, 9, 5));
    assert_eq!(agua.fields.net_amount, Some(Decimal::from(42_017)));
    assert_eq!(agua.fields.tax_amount, Some(Decimal::from(7_983)));
    assert_eq!(agua.fields.total_amount, Some(Decimal::from(50_000)));
}

#[test]
fn test_folders_from_uploads() {
    let (store, _) = seeded();
    let records = store.list().unwrap();
    let folders = ledger::aggregate(&records);

    let summary: Vec<(&str, usize, Decimal)> = folders
        .iter()
        .map(|f| (f.key.as_str(), f.totals.count, f.totals.total))
        .collect();
    assert_eq!(
        summary,
        vec![("LUZ", 2, Decimal::from(200_000)), ("AGUA", 1, Decimal::from(50_000))]
    );
}

#[test]
fn test_move_then_selection_totals() {
    let (mut store, _) = seeded();
    let report = ledger::move_many(&mut store, &[RecordId(1), RecordId(2)], Some("Hogar"), t0());
    assert!(report.is_complete());

    let records = store.list().unwrap();
    let query = RecordQuery {
        folder: Some("Hogar".to_string()),
        ..Default::default()
    };
    let hogar = query.apply(&records);
    assert_eq!(hogar.len(), 2);

    let whole = ledger::recompute(&hogar, &HashSet::new());
    assert_eq!(whole.totals.total, Decimal::from(150_000));

    let selection: HashSet<RecordId> = [RecordId(2)].into_iter().collect();
    let selected = ledger::recompute(&hogar, &selection);
    assert_eq!(selected.totals.total, Decimal::from(50_000));
    assert_eq!(selected.totals.net, Decimal::from(42_017));
}

#[test]
fn test_extraction_is_total() {
    let parser = RuleBasedParser::new();
    for text in ["", "\u{0}\u{1}", "TOTAL", "FACTURA ELECTRONICA N°", "Fecha: 31/02/2024", "€€€ 1,2,3 ..."] {
        let fields = parser.extract(text);
        assert_eq!(fields.issue_date, None);
    }
}

#[test]
fn test_sweep_end_to_end() {
    let (mut store, _) = seeded();
    ledger::set_due_date(&mut store, RecordId(1), Some(t0() + Duration::hours(12)), t0()).unwrap();
    ledger::set_due_date(&mut store, RecordId(2), Some(t0() + Duration::days(5)), t0()).unwrap();
    ledger::set_due_date(&mut store, RecordId(3), Some(t0() + Duration::days(5)), t0()).unwrap();
    ledger::update_payment_status(&mut store, RecordId(3), PaymentStatus::Paid, t0()).unwrap();

    let sweep = ExpirationSweep::from_config(&ExpirationConfig::default());
    let transport = Recording::default();
    let report = sweep.run(&mut store, &transport, t0()).unwrap();

    assert_eq!(report.sent, vec![RecordId(1), RecordId(2)]);
    let sent = transport.sent.borrow();
    assert_eq!(sent[0].tier, Tier::Urgent);
    assert_eq!(sent[0].subject, "ACCIÓN REQUERIDA: \"Luz\" vence en menos de 24h");
    assert_eq!(sent[1].tier, Tier::Reminder);
    assert_eq!(sent[1].link, "http://localhost:3000/facturas/2");
    drop(sent);

    // A second pass at the same instant sends nothing new.
    let again = sweep.run(&mut store, &transport, t0()).unwrap();
    assert!(again.sent.is_empty());
    assert_eq!(again.already_notified, 2);

    // Rescheduling re-arms the reminder.
    ledger::set_due_date(&mut store, RecordId(2), Some(t0() + Duration::days(6)), t0()).unwrap();
    let rearmed = sweep.run(&mut store, &transport, t0()).unwrap();
    assert_eq!(rearmed.sent, vec![RecordId(2)]);
}

#[test]
fn test_delete_releases_document() {
    let (mut store, mut blobs) = seeded();
    let locator = store.get(RecordId(2)).unwrap().locator;
    assert!(blobs.contains(&locator));

    ledger::delete_invoice(&mut store, &mut blobs, RecordId(2)).unwrap();
    assert!(!blobs.contains(&locator));
    assert_eq!(store.list().unwrap().len(), 2);
}
