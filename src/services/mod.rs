// Services - workflows composed over the repositories

pub mod checkout;

pub use checkout::CheckoutService;
