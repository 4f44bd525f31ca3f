//! Chat relay and streaming client for hosted LLM inference, in a strictly linted crate.

// Interdiction stricte de pratiques dangereuses ou non idiomatiques
#![deny(unsafe_code)] // Le code unsafe est interdit
#![deny(missing_docs)] // Toute fonction, struct, enum ou module public doit être documenté
#![deny(non_camel_case_types)]
// Les types doivent suivre la convention CamelCase (exception explicite possible au besoin)

// Options supplémentaires pour ne rien laisser passer
#![deny(unused_must_use)] // Oblige à gérer explicitement les Result et Option
#![deny(non_snake_case)] // Les noms de variables et fonctions doivent être en snake_case
#![deny(non_upper_case_globals)] // Les constantes et globals doivent être en MAJUSCULE
#![deny(nonstandard_style)] // Empêche tout style de code non standard
#![forbid(unsafe_op_in_unsafe_fn)]
// Interdit l'utilisation d'unsafe même dans une fonction unsafe

// Clippy pour stricte discipline
#![deny(clippy::all)] // Active toutes les lints Clippy standard
#![cfg_attr(not(test), deny(clippy::unwrap_used))] // Interdit unwrap()
#![cfg_attr(not(test), deny(clippy::expect_used))] // Interdit expect()
#![cfg_attr(not(test), deny(clippy::panic))] // Interdit panic!()
#![deny(clippy::print_stdout)] // Interdit println!() en production
#![deny(clippy::todo)] // Interdit les TODO dans le code
#![deny(clippy::unimplemented)] // Interdit les fonctions non implémentées
#![deny(clippy::unwrap_in_result)] // Interdit unwrap() sur Result
#![deny(clippy::module_inception)] // Interdit un module ayant le même nom que le crate

// Lints pour sécurité et robustesse
#![deny(overflowing_literals)] // Interdit les littéraux qui débordent

/// Chat client components: conversation log, stream consumer, attachments,
/// history persistence and the submit pipeline.
pub mod client;
/// Request composition: message history to provider request.
pub mod composer;
/// Configuration for the relay, provider, search and client layers.
pub mod config;
/// Error taxonomy shared across the crate.
pub mod error;
/// Conversation data model.
pub mod message;
/// Upstream model provider client and event types.
pub mod provider;
/// HTTP relay server and API routes.
pub mod relay;
/// Web search provider client.
pub mod search;
/// Normalized event-stream codec shared by the relay and the consumer.
pub mod sse;
/// Entry helpers to start the relay server.
pub mod start_murmur_chat;
/// Wire types for the relay chat endpoint.
pub mod wire;
