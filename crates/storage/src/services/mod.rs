pub mod ranking_computation;
