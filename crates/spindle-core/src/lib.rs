//! spindle-core
//!
//! Core building blocks for the Spindle function runtime: watch one key of a
//! key-value store, run a user handler on every change, publish the result.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（HandlerSpec, ExecutionContext, ChangeState, codec, errors）
//! - **ports**: 抽象化レイヤー（KvStore, Handler, HandlerLoader）
//! - **impls**: 実装（InMemoryStore, RedisStore, ProcessHandler, InlineLoader, ArchiveLoader）
//! - **app**: アプリケーションロジック（config, resolver, poller, runtime, retry）
//! - **observability**: ログ初期化

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;
