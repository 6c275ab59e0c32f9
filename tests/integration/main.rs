// Copyright © 2024 Pathway

mod helpers;

mod test_config;
mod test_dispatch;
