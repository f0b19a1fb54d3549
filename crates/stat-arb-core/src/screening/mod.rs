pub mod cointegration;
