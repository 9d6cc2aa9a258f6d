// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod environment;
mod registration;
mod reply_queue;
mod status;
