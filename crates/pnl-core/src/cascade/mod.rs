pub mod revenue;

pub use revenue::{
    cascade_revenue, distribute, MunicipalityRevenue, RevenueCascade, RevenueShare,
};
