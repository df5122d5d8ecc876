//! Conformance tests run once per [`AnyStatistic`] kind, the same way
//! `mempool::test::suite` runs `test_ordering_by_gas_price` once per
//! `Mempool` implementation.

use crate::statistic::AnyStatistic;

pub fn test_zero_samples_reports_nan_and_zero_count(empty: AnyStatistic) {
    assert_eq!(empty.count(), 0);
    assert!(empty.mean().is_nan());
    assert!(empty.pvariance().is_nan());
    assert!(empty.pstdev().is_nan());
}

pub fn test_single_sample_reports_zero_variance(mut stat: AnyStatistic, value: i64) {
    stat.add(value);
    assert_eq!(stat.count(), 1);
    assert!((stat.pvariance()).abs() < 1e-6);
    assert!((stat.pstdev()).abs() < 1e-6);
}

pub fn test_combine_with_empty_is_identity(mut populated: AnyStatistic, empty: AnyStatistic) {
    populated.add(10);
    populated.add(20);
    populated.add(30);

    let lhs = populated.combine(&empty).expect("same-kind combine");
    let rhs = empty.combine(&populated).expect("same-kind combine");

    assert_eq!(lhs.count(), populated.count());
    assert_eq!(rhs.count(), populated.count());
}

pub fn test_combine_across_kinds_is_type_mismatch(a: AnyStatistic, b: AnyStatistic) {
    assert_ne!(a.kind_name(), b.kind_name());
    let err = a.combine(&b).unwrap_err();
    match err {
        crate::statistic::CombineError::TypeMismatch(_, _) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdr::HdrStatistic;
    use crate::simple::SimpleStatistic;
    use crate::streaming::StreamingStatistic;

    #[test]
    fn simple_conformance() {
        test_zero_samples_reports_nan_and_zero_count(AnyStatistic::Simple(SimpleStatistic::new()));
        test_single_sample_reports_zero_variance(
            AnyStatistic::Simple(SimpleStatistic::new()),
            42,
        );
        test_combine_with_empty_is_identity(
            AnyStatistic::Simple(SimpleStatistic::new()),
            AnyStatistic::Simple(SimpleStatistic::new()),
        );
    }

    #[test]
    fn streaming_conformance() {
        test_zero_samples_reports_nan_and_zero_count(AnyStatistic::Streaming(
            StreamingStatistic::new(),
        ));
        test_single_sample_reports_zero_variance(
            AnyStatistic::Streaming(StreamingStatistic::new()),
            42,
        );
        test_combine_with_empty_is_identity(
            AnyStatistic::Streaming(StreamingStatistic::new()),
            AnyStatistic::Streaming(StreamingStatistic::new()),
        );
    }

    #[test]
    fn hdr_conformance() {
        test_zero_samples_reports_nan_and_zero_count(AnyStatistic::Hdr(HdrStatistic::new()));
        test_single_sample_reports_zero_variance(AnyStatistic::Hdr(HdrStatistic::new()), 1_000_000);
        test_combine_with_empty_is_identity(
            AnyStatistic::Hdr(HdrStatistic::new()),
            AnyStatistic::Hdr(HdrStatistic::new()),
        );
    }

    #[test]
    fn cross_kind_combine_is_rejected() {
        test_combine_across_kinds_is_type_mismatch(
            AnyStatistic::Simple(SimpleStatistic::new()),
            AnyStatistic::Streaming(StreamingStatistic::new()),
        );
        test_combine_across_kinds_is_type_mismatch(
            AnyStatistic::Streaming(StreamingStatistic::new()),
            AnyStatistic::Hdr(HdrStatistic::new()),
        );
    }
}
