// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Format an error message with the code location appended.
#[macro_export]
macro_rules! err_msg {
    ($e:expr) => ({
        format!("{} ({}:{})", $e, file!(), line!())
    });

    ($f:tt, $($arg:expr),+) => ({
        format!("{} ({}:{})", format!($f, $($arg),+), file!(), line!())
    });
}

// Build an Err of the surrounding function's error type from a message or
// another error, keeping the code location.
#[macro_export]
macro_rules! err_box {
    ($e:expr) => ({
        Err($crate::err_msg!($e).into())
    });

    ($f:tt, $($arg:expr),+) => ({
        $crate::err_box!(format!($f, $($arg),+))
    });
}

/// Unwrap an Option or fail the surrounding function.
#[macro_export]
macro_rules! try_option {
    ($expr:expr) => {{
        match $expr {
            None => return $crate::err_box!("Uninitialized"),
            Some(res) => res,
        }
    }};

   ($expr:expr, $f:tt, $($arg:expr),+) => ({
        match $expr {
            None => return $crate::err_box!(format!($f, $($arg),+)),
            Some(res) => res,
        }
    });
}

#[macro_export]
macro_rules! try_option_mut {
    ($expr:expr) => {{
        $crate::try_option!($expr.as_mut())
    }};
}

#[macro_export]
macro_rules! ternary {
    ($condition:expr, $true_expr:expr, $false_expr:expr) => {
        if $condition {
            $true_expr
        } else {
            $false_expr
        }
    };
}
