//! Flowmap Core Types and Definitions
//!
//! This crate provides the foundational types for flowmap process and
//! energy-flow diagrams. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, sizes and bounding boxes ([`geometry`] module)
//! - **Draw**: Stroke and text definitions shared by renderers ([`draw`] module)
//! - **Semantic**: The input data model of diagrams and their dated variants ([`semantic`] module)

pub mod color;
pub mod draw;
pub mod geometry;
pub mod identifier;
pub mod semantic;
