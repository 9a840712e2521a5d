//! Series transformations: Box-Cox and differencing.
//!
//! # Example
//!
//! ```
//! use shopping_forecast::transform::{boxcox, inv_boxcox, difference};
//!
//! let series = vec![1.0, 2.0, 4.0, 8.0];
//! let logged = boxcox(&series, 0.0).unwrap();
//! let back = inv_boxcox(&logged, 0.0);
//! assert!((back[3] - 8.0).abs() < 1e-12);
//!
//! assert_eq!(difference(&series, 1), vec![1.0, 2.0, 4.0]);
//! ```

pub mod boxcox;
pub mod diff;

pub use boxcox::{
    boxcox, boxcox_auto, boxcox_lambda, boxcox_value, inv_boxcox, inv_boxcox_value,
    is_boxcox_suitable, BoxCoxResult, LambdaMethod, LambdaSearch,
};
pub use diff::{
    difference, difference_orders, differencing_polynomial, integrate, lag_difference, multiply,
    seasonal_difference,
};
