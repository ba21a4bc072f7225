// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub(crate) const MEMO_FUNCTION_NAME: &str = "memo.function";

pub(crate) const MEMO_OPERATION_NAME: &str = "memo.operation";

pub(crate) const MEMO_ACTIVITY_NAME: &str = "memo.activity";

#[cfg(test)]
pub(crate) const MEMO_DURATION_NAME: &str = "memo.duration_ns";

#[cfg(test)]
pub(crate) const MEMO_EVENT_NAME: &str = "memo.event";
