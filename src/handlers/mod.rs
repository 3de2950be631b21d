// handlers/mod.rs - two tiers
//
// Public (no caller resolution): service info and health probes
// Protected (caller resolved by the access policy): /api/backend/*
pub mod protected;
pub mod public;
