use chrono::Utc;
use proptest::prelude::*;
use propkit_core::{
    costing::{fx::apply_buffer, round_money},
    rupees_in_words, BoqLine, CostingEngine, EffortSource, ExchangeRate, RateCard,
};
use rust_decimal::Decimal;

const DESCRIPTIONS: [&str; 5] = [
    "Discovery Workshop",
    "Landing zone build",
    "Data migration wave",
    "Runbook documentation",
    "Hypercare support",
];

fn boq_line() -> impl Strategy<Value = BoqLine> {
    (0..DESCRIPTIONS.len(), 0u32..60).prop_map(|(index, man_days)| BoqLine {
        description: DESCRIPTIONS[index].to_string(),
        man_days,
        effort_source: if man_days > 0 {
            EffortSource::Explicit { rule: "man_days_suffix".to_string() }
        } else {
            EffortSource::Unresolved
        },
    })
}

fn gst_rate() -> Decimal {
    Decimal::new(18, 2)
}

proptest! {
    #[test]
    fn subtotal_tax_and_final_amount_are_consistent(
        lines in prop::collection::vec(boq_line(), 0..12),
        raw_cents in 7_000i64..9_500,
    ) {
        let fx = ExchangeRate::live(Decimal::new(raw_cents, 2), Utc::now());
        let engine = CostingEngine::new(RateCard::default(), gst_rate());
        let sheet = engine.cost_lines(&lines, &fx);

        prop_assert_eq!(sheet.items.len(), lines.len());
        let summed: Decimal = sheet.items.iter().filter_map(|item| item.total_inr()).sum();
        prop_assert_eq!(sheet.summary.subtotal_inr, summed);
        prop_assert_eq!(sheet.summary.gst_inr, round_money(sheet.summary.subtotal_inr * gst_rate()));
        prop_assert_eq!(sheet.summary.final_inr, sheet.summary.subtotal_inr + sheet.summary.gst_inr);
        prop_assert_eq!(sheet.summary.final_inr.scale(), 2);

        for (line, item) in lines.iter().zip(&sheet.items) {
            prop_assert_eq!(item.pricing.is_some(), line.man_days > 0);
            if let Some(pricing) = &item.pricing {
                prop_assert_eq!(pricing.rate_inr, round_money(pricing.rate_usd * fx.rate));
                prop_assert_eq!(
                    pricing.total_inr,
                    round_money(pricing.rate_inr * Decimal::from(line.man_days))
                );
            }
        }
    }

    #[test]
    fn half_cents_round_away_from_zero(cents in 0i64..10_000_000) {
        let midpoint = Decimal::new(cents * 10 + 5, 3);
        prop_assert_eq!(round_money(midpoint), Decimal::new(cents + 1, 2));
        prop_assert_eq!(round_money(-midpoint), Decimal::new(-(cents + 1), 2));

        let below = Decimal::new(cents * 10 + 4, 3);
        prop_assert_eq!(round_money(below), Decimal::new(cents, 2));
    }

    #[test]
    fn buffer_adds_exactly_one_rupee(raw_milli in 50_000i64..120_000) {
        let raw = Decimal::new(raw_milli, 3);
        prop_assert_eq!(apply_buffer(raw), round_money(raw + Decimal::ONE));
        prop_assert!(apply_buffer(raw) > raw);
    }

    #[test]
    fn final_amount_always_has_words(rupees in 0i64..2_000_000_000, paise in 0i64..100) {
        let words = rupees_in_words(Decimal::new(rupees * 100 + paise, 2));
        prop_assert!(words.ends_with(" Rupees Only"));
        prop_assert!(!words.contains("  "));
    }
}
