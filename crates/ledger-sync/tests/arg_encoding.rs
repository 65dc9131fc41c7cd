#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Property tests for the positional argument encoding of `CreateBatch`.

use agritrack_ledger_sync::gateway::create_batch_args;
use agritrack_sync_store::{RecordId, record::BatchRecord};
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use uuid::Uuid;

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_time() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

fn arb_batch() -> impl Strategy<Value = BatchRecord> {
    (
        arb_uuid(),
        arb_uuid(),
        "[A-Z]{2,5}-[0-9]{1,6}",
        any::<u32>(),
        arb_time(),
        proptest::option::of(arb_time()),
        proptest::option::of("[a-zA-Z0-9 ]{1,20}"),
        proptest::option::of("https://[a-z]{3,10}\\.example/[a-z0-9]{1,8}"),
        proptest::option::of(".{0,40}"),
    )
        .prop_map(
            |(
                product_id,
                farmer_id,
                batch_number,
                quantity,
                start_date,
                expected_end_date,
                location,
                qr_code,
                notes,
            )| BatchRecord {
                product_id,
                farmer_id,
                batch_number,
                quantity,
                start_date,
                expected_end_date,
                location,
                qr_code,
                notes,
            },
        )
}

proptest! {
    /// The same record always encodes to the same argument list.
    #[test]
    fn encoding_is_deterministic(id in arb_uuid(), batch in arb_batch()) {
        let id = RecordId::from(id);
        prop_assert_eq!(create_batch_args(id, &batch), create_batch_args(id, &batch.clone()));
    }

    /// Positions are fixed and every value survives as its canonical text.
    #[test]
    fn positions_follow_chaincode_signature(id in arb_uuid(), batch in arb_batch()) {
        let args = create_batch_args(RecordId::from(id), &batch);

        prop_assert_eq!(args.len(), 10);
        prop_assert_eq!(&args[0], &id.hyphenated().to_string());
        prop_assert_eq!(&args[1], &batch.product_id.to_string());
        prop_assert_eq!(&args[2], &batch.farmer_id.to_string());
        prop_assert_eq!(&args[3], &batch.batch_number);
        prop_assert_eq!(args[4].parse::<u32>().unwrap(), batch.quantity);
        prop_assert_eq!(
            DateTime::parse_from_rfc3339(&args[5]).unwrap().with_timezone(&Utc),
            batch.start_date
        );
        prop_assert_eq!(args[6].is_empty(), batch.expected_end_date.is_none());
        prop_assert_eq!(&args[7], batch.location.as_deref().unwrap_or("unspecified"));
        prop_assert_eq!(&args[8], batch.qr_code.as_deref().unwrap_or_default());
        prop_assert_eq!(&args[9], batch.notes.as_deref().unwrap_or_default());
    }

    /// Timestamps are second-precision UTC with a `Z` suffix.
    #[test]
    fn timestamps_are_utc_seconds(batch in arb_batch()) {
        let args = create_batch_args(RecordId::new(), &batch);
        prop_assert!(args[5].ends_with('Z'), "{}", args[5]);
        prop_assert!(!args[5].contains('.'), "{}", args[5]);
    }
}
