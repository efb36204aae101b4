//! Price-based valuation ratios.
//!
//! These combine one day's close and share count with fundamentals resolved
//! for that day. Ratios are price over a per-share fundamental, so a zero or
//! missing fundamental leaves the ratio undefined.

use crate::primitives::{difference, finite, safe_ratio, sum};

/// Close times shares outstanding.
pub fn market_cap(price: Option<f64>, shares: Option<f64>) -> Option<f64> {
    finite(price? * shares?)
}

/// Market cap plus total debt minus cash.
pub fn enterprise_value(
    market_cap: Option<f64>,
    total_debt: Option<f64>,
    cash: Option<f64>,
) -> Option<f64> {
    difference(sum(market_cap, total_debt), cash)
}

/// Price over TTM earnings per share.
pub fn pe(price: Option<f64>, shares: Option<f64>, net_income_ttm: Option<f64>) -> Option<f64> {
    safe_ratio(price, safe_ratio(net_income_ttm, shares))
}

/// Price over book value per share.
pub fn pb(price: Option<f64>, shares: Option<f64>, total_equity: Option<f64>) -> Option<f64> {
    safe_ratio(price, safe_ratio(total_equity, shares))
}

/// Price over TTM revenue per share.
pub fn ps(price: Option<f64>, shares: Option<f64>, revenue_ttm: Option<f64>) -> Option<f64> {
    safe_ratio(price, safe_ratio(revenue_ttm, shares))
}

/// Enterprise value over TTM EBITDA.
pub fn ev_ebitda(enterprise_value: Option<f64>, ebitda_ttm: Option<f64>) -> Option<f64> {
    safe_ratio(enterprise_value, ebitda_ttm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pe() {
        // EPS = 460 / 100 = 4.6
        assert_relative_eq!(
            pe(Some(46.0), Some(100.0), Some(460.0)).unwrap(),
            10.0,
            epsilon = 1e-9
        );
        assert_eq!(pe(Some(46.0), Some(100.0), Some(0.0)), None);
        assert_eq!(pe(Some(46.0), Some(0.0), Some(460.0)), None);
        assert_eq!(pe(Some(46.0), Some(100.0), None), None);
    }

    #[test]
    fn test_pe_keeps_sign_of_losses() {
        assert!(pe(Some(10.0), Some(100.0), Some(-50.0)).unwrap() < 0.0);
    }

    #[test]
    fn test_ev_ebitda() {
        let mcap = market_cap(Some(10.0), Some(100.0));
        let ev = enterprise_value(mcap, Some(300.0), Some(100.0));
        assert_eq!(ev, Some(1200.0));
        assert_relative_eq!(ev_ebitda(ev, Some(150.0)).unwrap(), 8.0, epsilon = 1e-9);
        assert_eq!(enterprise_value(mcap, None, Some(100.0)), None);
    }

    #[test]
    fn test_pb_and_ps() {
        assert_relative_eq!(
            pb(Some(20.0), Some(100.0), Some(1000.0)).unwrap(),
            2.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            ps(Some(20.0), Some(100.0), Some(4000.0)).unwrap(),
            0.5,
            epsilon = 1e-9
        );
    }
}
