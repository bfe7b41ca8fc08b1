use chrono::{Datelike, NaiveDate};
use draw_schedule_core::calendar::{month_end, Calendar};
use draw_schedule_core::config::{DrawInput, PaydownInput, ScheduleConfig};
use draw_schedule_core::policy::{
    DrawPolicy, InterestPolicy, PaydownPolicy, PaydownSchedule, UnitSale,
};
use draw_schedule_core::schedule::{build_schedule, flat_table, generate, LoanParameters, PeriodRecord};
use draw_schedule_core::ScheduleError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn small_loan() -> LoanParameters {
    LoanParameters {
        principal: dec!(100000),
        annual_rate: dec!(0.12),
        term_periods: 3,
    }
}

fn assert_invariants(records: &[PeriodRecord], loan: &LoanParameters, interest: InterestPolicy) {
    assert_eq!(records.len(), loan.term_periods as usize);
    assert_eq!(records[0].beginning_balance, loan.principal);
    let mut cumulative = Decimal::ZERO;
    for (idx, r) in records.iter().enumerate() {
        assert_eq!(r.period as usize, idx + 1);
        assert_eq!(r.ending_balance, r.beginning_balance + r.total_draw - r.paydown);
        let expected_total = if interest.capitalizes() {
            r.construction_draw + r.interest_draw
        } else {
            r.construction_draw
        };
        assert_eq!(r.total_draw, expected_total);
        cumulative += r.construction_draw;
        assert_eq!(r.cumulative_drawn, cumulative);
    }
    for pair in records.windows(2) {
        assert_eq!(pair[0].ending_balance, pair[1].beginning_balance);
        assert!(pair[0].date < pair[1].date);
    }
}

// ===========================================================================
// Known-answer scenarios
// ===========================================================================

#[test]
fn test_capitalized_interest_known_answer() {
    let loan = small_loan();
    let records = generate(
        &loan,
        &Calendar::new(date(2024, 1, 1)),
        &DrawPolicy::Fixed(Decimal::ZERO),
        &PaydownPolicy::new(PaydownSchedule::Fixed(Decimal::ZERO), None),
        InterestPolicy::Capitalized,
    )
    .unwrap();

    let rows: Vec<(Decimal, Decimal, Decimal)> = records
        .iter()
        .map(|r| (r.beginning_balance, r.interest_draw, r.ending_balance))
        .collect();
    assert_eq!(
        rows,
        vec![
            (dec!(100000), dec!(1000), dec!(101000)),
            (dec!(101000), dec!(1010), dec!(102010)),
            (dec!(102010), dec!(1020.10), dec!(103030.10)),
        ]
    );
    assert_invariants(&records, &loan, InterestPolicy::Capitalized);
}

#[test]
fn test_expensed_interest_with_fixed_paydown() {
    let loan = small_loan();
    let records = generate(
        &loan,
        &Calendar::new(date(2024, 1, 1)),
        &DrawPolicy::Fixed(Decimal::ZERO),
        &PaydownPolicy::new(PaydownSchedule::Fixed(dec!(500)), None),
        InterestPolicy::ExpensedOnly,
    )
    .unwrap();

    let ends: Vec<Decimal> = records.iter().map(|r| r.ending_balance).collect();
    assert_eq!(ends, vec![dec!(99500), dec!(99000), dec!(98500)]);
    assert_invariants(&records, &loan, InterestPolicy::ExpensedOnly);
}

#[test]
fn test_leap_year_anchor_dates() {
    let records = generate(
        &small_loan(),
        &Calendar::new(date(2024, 2, 15)),
        &DrawPolicy::Fixed(Decimal::ZERO),
        &PaydownPolicy::none(),
        InterestPolicy::Capitalized,
    )
    .unwrap();
    assert_eq!(records[0].date, date(2024, 2, 29));
    assert_eq!(records[1].date, date(2024, 3, 31));
    assert_eq!(records[2].date, date(2024, 4, 30));
}

// ===========================================================================
// Invariants across policy combinations
// ===========================================================================

#[test]
fn test_invariants_hold_for_every_policy_combination() {
    let loan = LoanParameters {
        principal: dec!(11830000),
        annual_rate: dec!(0.08),
        term_periods: 36,
    };
    let calendar = Calendar::new(date(2023, 11, 17));
    let draws = vec![
        DrawPolicy::Fixed(dec!(200000)),
        DrawPolicy::per_period(vec![dec!(350000), dec!(0), dec!(125000.55)], 36),
    ];
    let paydowns = vec![
        PaydownSchedule::Fixed(dec!(150000)),
        PaydownSchedule::derived(dec!(3), dec!(50000)),
        PaydownSchedule::per_period(vec![dec!(10000); 40], 36),
        PaydownSchedule::per_period_derived(
            vec![
                UnitSale {
                    units: dec!(2),
                    amount_per_unit: dec!(48000),
                };
                12
            ],
            36,
        ),
    ];

    for draw in &draws {
        for schedule in &paydowns {
            for start in [None, Some(7)] {
                for interest in [InterestPolicy::Capitalized, InterestPolicy::ExpensedOnly] {
                    let paydown = PaydownPolicy::new(schedule.clone(), start);
                    let records = generate(&loan, &calendar, draw, &paydown, interest).unwrap();
                    assert_invariants(&records, &loan, interest);
                    if let Some(start) = start {
                        for r in records.iter().filter(|r| r.period < start) {
                            assert_eq!(r.paydown, Decimal::ZERO);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_dates_never_skip_a_month() {
    let calendar = Calendar::new(date(2023, 1, 31));
    let records = generate(
        &LoanParameters {
            term_periods: 30,
            ..small_loan()
        },
        &calendar,
        &DrawPolicy::Fixed(Decimal::ZERO),
        &PaydownPolicy::none(),
        InterestPolicy::Capitalized,
    )
    .unwrap();

    for (idx, r) in records.iter().enumerate() {
        assert_eq!(month_end(r.date), r.date);
        let months = (r.date.year() - 2023) * 12 + r.date.month0() as i32;
        assert_eq!(months, idx as i32);
    }
    assert_eq!(records[1].date, date(2023, 2, 28));
    assert_eq!(records[13].date, date(2024, 2, 29));
}

#[test]
fn test_over_draw_exceeds_principal() {
    let records = generate(
        &small_loan(),
        &Calendar::new(date(2024, 1, 1)),
        &DrawPolicy::Fixed(dec!(250000)),
        &PaydownPolicy::none(),
        InterestPolicy::ExpensedOnly,
    )
    .unwrap();
    assert_eq!(records[2].ending_balance, dec!(850000));
}

#[test]
fn test_unnormalised_policy_fails_fast() {
    let err = generate(
        &small_loan(),
        &Calendar::new(date(2024, 1, 1)),
        &DrawPolicy::Fixed(Decimal::ZERO),
        &PaydownPolicy::new(PaydownSchedule::PerPeriod(vec![dec!(1)]), None),
        InterestPolicy::Capitalized,
    )
    .unwrap_err();
    assert!(matches!(err, ScheduleError::Configuration(_)));
}

// ===========================================================================
// Configuration-driven builds
// ===========================================================================

#[test]
fn test_original_tool_defaults() {
    // 11.83m at 8% over three years, 200k monthly draws, three lots a month at 50k
    let config = ScheduleConfig {
        loan: LoanParameters {
            principal: dec!(11830000),
            annual_rate: dec!(0.08),
            term_periods: 36,
        },
        anchor_date: date(2025, 6, 12),
        draw: DrawInput::Fixed {
            amount: dec!(200000),
        },
        paydown: PaydownInput::Derived {
            units_per_period: dec!(3),
            amount_per_unit: dec!(50000),
        },
        paydown_start_period: None,
        paydown_start_date: None,
        interest: InterestPolicy::Capitalized,
    };
    let out = build_schedule(&config).unwrap();
    let periods = &out.result.periods;
    assert_eq!(periods.len(), 36);
    assert_eq!(periods[0].date, date(2025, 6, 30));
    assert_eq!(periods[35].date, date(2028, 5, 31));
    assert_eq!(periods[0].paydown, dec!(150000));
    assert!(out.warnings.is_empty());

    let rows = flat_table(periods, true);
    assert_eq!(rows[0].beginning_balance, "11830000.00");
    assert_eq!(rows[0].interest_draw, "78866.67");
    assert_eq!(rows[0].total_draw, "278866.67");
    assert_eq!(rows[0].ending_balance, "11958866.67");
    assert_eq!(
        out.result.summary.final_balance,
        periods[35].ending_balance
    );
}

#[test]
fn test_yaml_style_text_inputs_recover_from_garbage() {
    let json = r#"{
        "loan": { "principal": 500000, "annual_rate": 0.06, "term_periods": 4 },
        "anchor_date": "2024-12-05",
        "draw": { "type": "text", "text": "100000, n/a, 50000, 25000, 999" },
        "paydown": { "type": "unit_sales", "sales": [ { "units": 1, "amount_per_unit": 40000 } ] },
        "paydown_start_date": "2025-01-20",
        "interest": "expensed_only"
    }"#;
    let config: ScheduleConfig = serde_json::from_str(json).unwrap();
    let out = build_schedule(&config).unwrap();
    let periods = &out.result.periods;

    let draws: Vec<Decimal> = periods.iter().map(|r| r.construction_draw).collect();
    assert_eq!(draws, vec![dec!(100000), dec!(0), dec!(50000), dec!(25000)]);
    // gate starts in January: December's unit sale is suppressed
    let paydowns: Vec<Decimal> = periods.iter().map(|r| r.paydown).collect();
    assert_eq!(paydowns, vec![dec!(0), dec!(0), dec!(0), dec!(0)]);
    assert_eq!(periods[1].date, date(2025, 1, 31));
    // one rejected entry, one truncation, one padding
    assert_eq!(out.warnings.len(), 3);
}

// ===========================================================================
// Decimal range
// ===========================================================================

fn large_loan_config(paydown: PaydownInput) -> ScheduleConfig {
    ScheduleConfig {
        loan: LoanParameters {
            principal: dec!(50000000000000000000000000000),
            annual_rate: Decimal::ZERO,
            term_periods: 6,
        },
        anchor_date: date(2024, 1, 1),
        draw: DrawInput::default(),
        paydown,
        paydown_start_period: None,
        paydown_start_date: None,
        interest: InterestPolicy::Capitalized,
    }
}

#[test]
fn test_paydown_total_out_of_range_is_an_error() {
    // every balance fits, the six-period paydown total does not
    let config = large_loan_config(PaydownInput::Fixed {
        amount: dec!(20000000000000000000000000000),
    });
    let err = build_schedule(&config).unwrap_err();
    assert!(matches!(err, ScheduleError::Overflow(_)), "{err}");
}

#[test]
fn test_derived_paydown_out_of_range_is_an_error() {
    let config = large_loan_config(PaydownInput::Derived {
        units_per_period: dec!(100000000000000000000),
        amount_per_unit: dec!(100000000000000000000),
    });
    let err = build_schedule(&config).unwrap_err();
    assert!(matches!(err, ScheduleError::Overflow(_)), "{err}");
}
