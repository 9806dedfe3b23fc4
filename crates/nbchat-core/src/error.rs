// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use nbchat_model::CompletionError;
use thiserror::Error;

use crate::host::HostError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("another request is still in flight for this session")]
    Busy,

    #[error("no notebook is bound to this session")]
    NotBound,

    #[error("the active notebook changed while the request was in flight; response discarded")]
    BindingChanged,

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Host(#[from] HostError),
}
