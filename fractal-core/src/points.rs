//! Generic 2D point/rect helpers shared by pixel-space and fractal-space types.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<T> {
    x: T,
    y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> &T {
        &self.x
    }

    pub fn y(&self) -> &T {
        &self.y
    }

    pub fn into_parts(self) -> (T, T) {
        (self.x, self.y)
    }

    pub fn add(&self, other: &Self) -> Self
    where
        T: Add<Output = T> + Clone,
    {
        Self {
            x: self.x.clone() + other.x.clone(),
            y: self.y.clone() + other.y.clone(),
        }
    }

    pub fn sub(&self, other: &Self) -> Self
    where
        T: Sub<Output = T> + Clone,
    {
        Self {
            x: self.x.clone() - other.x.clone(),
            y: self.y.clone() - other.y.clone(),
        }
    }

    pub fn mul_scalar(&self, scalar: &T) -> Self
    where
        T: Mul<Output = T> + Clone,
    {
        Self {
            x: self.x.clone() * scalar.clone(),
            y: self.y.clone() * scalar.clone(),
        }
    }

    pub fn div_scalar(&self, scalar: &T) -> Self
    where
        T: Div<Output = T> + Clone,
    {
        Self {
            x: self.x.clone() / scalar.clone(),
            y: self.y.clone() / scalar.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rect<T> {
    pub min: Point<T>,
    pub max: Point<T>,
}

impl<T> Rect<T> {
    pub fn new(min: Point<T>, max: Point<T>) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> T
    where
        T: Sub<Output = T> + Clone,
    {
        self.max.x().clone() - self.min.x().clone()
    }

    pub fn height(&self) -> T
    where
        T: Sub<Output = T> + Clone,
    {
        self.max.y().clone() - self.min.y().clone()
    }

    pub fn is_valid(&self) -> bool
    where
        T: PartialOrd + Clone,
    {
        self.min.x() <= self.max.x() && self.min.y() <= self.max.y()
    }
}

impl<T> Rect<T>
where
    T: Clone + std::ops::Add<Output = T> + std::ops::Div<Output = T> + From<f64>,
{
    pub fn center(&self) -> Point<T> {
        let two = T::from(2.0);
        let center_x = (self.min.x().clone() + self.max.x().clone()) / two.clone();
        let center_y = (self.min.y().clone() + self.max.y().clone()) / two;
        Point::new(center_x, center_y)
    }
}

/// A point in 3D space (camera position, ray direction, surface normal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Point3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl Point3<f64> {
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(&self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            *self
        } else {
            self.scale(1.0 / len)
        }
    }
}
