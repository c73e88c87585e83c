// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use crate::{DataSource, Result, Source};

macro_rules! delegate_impl {
    (with $reduced:expr;
	$(
	fn $name:ident($($params:tt)+)$( -> $ret:ty)?;
	)+) => {
		$(fn $name($($params)+)$( -> $ret)? {
			delegate_impl!(@$reduced;$name($($params)+))
		})+
	};
	(@$reduced:expr;$name:ident(&$(mut)? self$(, $param:ident: $param_ty:ty)*)) => {
		$reduced.$name($($param),*)
	};
}

macro_rules! impl_source {
    ($(impl<$gen:ident> for $ty:ty;)+) => {
		$(
		impl<$gen: Source + ?Sized> Source for $ty {
			delegate_impl! {
				with (**self);
				fn read(&self, buf: &mut [u8]) -> Result<Option<usize>>;
				fn skip(&self, count: u64) -> Result<u64>;
				fn available(&self) -> Result<usize>;
				fn close(&self) -> Result;
			}
		})+
	};
}

impl_source! {
	impl<S> for &S;
	impl<S> for Box<S>;
	impl<S> for Arc<S>;
}

macro_rules! impl_data_source {
    ($(impl<$gen:ident> for $ty:ty;)+) => {
		$(
		impl<$gen: DataSource + ?Sized> DataSource for $ty {
			delegate_impl! {
				with (**self);
				fn available_bytes(&mut self) -> Result<usize>;
				fn skip_bytes(&mut self, count: usize) -> Result<usize>;
				fn read_bool(&mut self) -> Result<bool>;
				fn read_u8(&mut self) -> Result<u8>;
				fn read_i8(&mut self) -> Result<i8>;
				fn read_u16(&mut self) -> Result<u16>;
				fn read_i16(&mut self) -> Result<i16>;
				fn read_u16_le(&mut self) -> Result<u16>;
				fn read_i16_le(&mut self) -> Result<i16>;
				fn read_u32(&mut self) -> Result<u32>;
				fn read_i32(&mut self) -> Result<i32>;
				fn read_u32_le(&mut self) -> Result<u32>;
				fn read_i32_le(&mut self) -> Result<i32>;
				fn read_u64(&mut self) -> Result<u64>;
				fn read_i64(&mut self) -> Result<i64>;
				fn read_u64_le(&mut self) -> Result<u64>;
				fn read_i64_le(&mut self) -> Result<i64>;
				fn read_u128(&mut self) -> Result<u128>;
				fn read_i128(&mut self) -> Result<i128>;
				fn read_u128_le(&mut self) -> Result<u128>;
				fn read_i128_le(&mut self) -> Result<i128>;
				fn read_f32(&mut self) -> Result<f32>;
				fn read_f64(&mut self) -> Result<f64>;
			}

			fn read_bytes<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8]> {
				(**self).read_bytes(buf)
			}

			fn read_exact_bytes<'a>(&mut self, buf: &'a mut [u8]) -> Result<&'a [u8]> {
				(**self).read_exact_bytes(buf)
			}
		})+
	};
}

impl_data_source! {
	impl<S> for &mut S;
	impl<S> for Box<S>;
}
