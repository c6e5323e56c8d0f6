// ==============================================================================
// lib.rs - GWAS Summary Statistics Audit Library
// ==============================================================================
// Description: Library interface for summary statistics audit modules
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================

pub mod aggregator;
pub mod audit;
pub mod config;
pub mod geometry;
pub mod issues;
pub mod models;
pub mod output;
pub mod parsers;
pub mod processor;
pub mod summary;
pub mod validator;
