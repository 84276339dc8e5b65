use chrono::{Duration, NaiveDate};
use hotel_reservation_management::domain::model::{
    ChargeKind, CompanyCode, GuestId, ItemCode, LineItem, Money, Reservation, ReservationId,
    StayRange,
};
use proptest::prelude::*;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

// Money のプロパティベーステスト
proptest! {
    /// Money の加算は交換法則を満たす (a + b = b + a)
    #[test]
    fn test_money_addition_is_commutative(
        amount1 in 0i64..1_000_000,
        amount2 in 0i64..1_000_000,
    ) {
        let money1 = Money::jpy(amount1);
        let money2 = Money::jpy(amount2);

        let result1 = money1.add(&money2).unwrap();
        let result2 = money2.add(&money1).unwrap();

        prop_assert_eq!(result1, result2);
    }

    /// Money の加算は結合法則を満たす ((a + b) + c = a + (b + c))
    #[test]
    fn test_money_addition_is_associative(
        amount1 in 0i64..100_000,
        amount2 in 0i64..100_000,
        amount3 in 0i64..100_000,
    ) {
        let money1 = Money::jpy(amount1);
        let money2 = Money::jpy(amount2);
        let money3 = Money::jpy(amount3);

        let result1 = money1.add(&money2).unwrap().add(&money3).unwrap();
        let result2 = money1.add(&money2.add(&money3).unwrap()).unwrap();

        prop_assert_eq!(result1, result2);
    }

    /// Money の乗算は分配法則を満たす (a * (b + c) = a * b + a * c)
    #[test]
    fn test_money_multiplication_distributive(
        base_amount in 1i64..10_000,
        factor1 in 1u32..100,
        factor2 in 1u32..100,
    ) {
        let money = Money::jpy(base_amount);

        let left_side = money.multiply(factor1 + factor2);
        let right_side = money.multiply(factor1).add(&money.multiply(factor2)).unwrap();

        prop_assert_eq!(left_side, right_side);
    }
}

// StayRange のプロパティベーステスト
proptest! {
    /// 宿泊日数は常に日付差に一致し、days() は両端を含む
    #[test]
    fn test_stay_range_night_and_day_counts(
        offset in 0i64..300,
        nights in 0i64..60,
    ) {
        let from = base_date() + Duration::days(offset);
        let to = from + Duration::days(nights);
        let range = StayRange::new(from, to).unwrap();

        prop_assert_eq!(range.night_count() as i64, nights);
        prop_assert_eq!(range.nights().len() as i64, nights);
        prop_assert_eq!(range.days().len() as i64, nights + 1);
    }

    /// チェックアウト日は宿泊日に含まれない（半開区間）
    #[test]
    fn test_stay_range_checkout_day_not_a_night(
        offset in 0i64..300,
        nights in 1i64..60,
    ) {
        let from = base_date() + Duration::days(offset);
        let to = from + Duration::days(nights);
        let range = StayRange::new(from, to).unwrap();

        prop_assert!(range.contains_night(from));
        prop_assert!(!range.contains_night(to));
    }

    /// 期間の分割は宿泊日数を保存する
    #[test]
    fn test_stay_range_split_preserves_nights(
        offset in 0i64..300,
        first_part in 1i64..30,
        second_part in 1i64..30,
    ) {
        let from = base_date() + Duration::days(offset);
        let middle = from + Duration::days(first_part);
        let to = middle + Duration::days(second_part);

        let whole = StayRange::new(from, to).unwrap();
        let head = StayRange::new(from, middle).unwrap();
        let tail = StayRange::new(middle, to).unwrap();

        prop_assert_eq!(
            whole.night_count(),
            head.night_count() + tail.night_count()
        );
    }

    /// 重なり判定は対称で、連続する期間は重ならない
    #[test]
    fn test_stay_range_overlap_symmetry(
        offset_a in 0i64..100,
        nights_a in 1i64..30,
        offset_b in 0i64..100,
        nights_b in 1i64..30,
    ) {
        let a = StayRange::new(
            base_date() + Duration::days(offset_a),
            base_date() + Duration::days(offset_a + nights_a),
        )
        .unwrap();
        let b = StayRange::new(
            base_date() + Duration::days(offset_b),
            base_date() + Duration::days(offset_b + nights_b),
        )
        .unwrap();

        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));

        let next = StayRange::new(a.to_date(), a.to_date() + Duration::days(1)).unwrap();
        prop_assert!(!a.overlaps(&next));
    }
}

// LineItem と Reservation のプロパティベーステスト
proptest! {
    /// 明細行の金額は常に単価 × 数量と等しい
    #[test]
    fn test_line_item_amount_calculation(
        quantity in 1u32..1000,
        rate in 1i64..100_000,
        day_offset in 0i64..300,
    ) {
        let item = ItemCode::new("DLX-NIGHT").unwrap();
        let date = base_date() + Duration::days(day_offset);
        let line = LineItem::new(
            item,
            ChargeKind::Incidental { date },
            quantity,
            Money::jpy(rate),
        )
        .unwrap();

        prop_assert_eq!(line.amount(), Money::jpy(rate).multiply(quantity));
    }

    /// 転記後も合計金額は全明細行の金額の合計と一致する
    #[test]
    fn test_net_total_always_matches_line_amounts(
        stay_rate in 1i64..100_000,
        nightly_rate in 1i64..10_000,
        posted_nights in 0usize..5,
    ) {
        let stay = StayRange::new(base_date(), base_date() + Duration::days(5)).unwrap();
        let item = ItemCode::new("DLX-NIGHT").unwrap();
        let mut reservation = Reservation::new(
            ReservationId::new(),
            CompanyCode::new("GRAND-HOTEL").unwrap(),
            stay,
            GuestId::new(),
            item.clone(),
            1,
        )
        .unwrap();
        reservation
            .apply_stay_rates(&[Some(Money::jpy(stay_rate))])
            .unwrap();
        reservation.book().unwrap();
        reservation.check_in().unwrap();

        for night in stay.nights().into_iter().take(posted_nights) {
            reservation
                .post_room_charge(item.clone(), night, Money::jpy(nightly_rate))
                .unwrap();
        }

        let sum: i64 = reservation
            .items()
            .iter()
            .map(|line| line.amount().amount())
            .sum();
        prop_assert_eq!(reservation.net_total().amount(), sum);
    }

    /// 同じ (アイテム, 日付) の転記は何度繰り返しても1行にしかならない
    #[test]
    fn test_posting_same_day_is_idempotent(
        nightly_rate in 1i64..10_000,
        attempts in 2u32..6,
    ) {
        let stay = StayRange::new(base_date(), base_date() + Duration::days(2)).unwrap();
        let item = ItemCode::new("DLX-NIGHT").unwrap();
        let mut reservation = Reservation::new(
            ReservationId::new(),
            CompanyCode::new("GRAND-HOTEL").unwrap(),
            stay,
            GuestId::new(),
            item.clone(),
            1,
        )
        .unwrap();
        reservation
            .apply_stay_rates(&[Some(Money::jpy(nightly_rate * 2))])
            .unwrap();
        reservation.book().unwrap();
        reservation.check_in().unwrap();

        let mut appended = 0u32;
        for _ in 0..attempts {
            if reservation
                .post_room_charge(item.clone(), base_date(), Money::jpy(nightly_rate))
                .unwrap()
            {
                appended += 1;
            }
        }

        prop_assert_eq!(appended, 1);
        let posted_lines = reservation
            .items()
            .iter()
            .filter(|line| line.posted_on(base_date()))
            .count();
        prop_assert_eq!(posted_lines, 1);
    }
}
