//! Lock-Free Single-Producer Single-Consumer (SPSC) Ring Buffer
//!
//! Implementasi reserved-slot queue: dua cursor ter-mask, satu slot selalu
//! dikosongkan sehingga `write == read` berarti kosong dan `write + 1 == read`
//! berarti penuh. Tidak ada Mutex, tidak ada alokasi setelah inisialisasi,
//! tidak ada loop di `push`/`pop`.
//!
//! # Compile-Time Enforcement
//!
//! Kapasitas yang bukan power of 2 (atau lebih kecil dari 2) gagal di-compile:
//!
//! ```compile_fail
//! use spsc_ring::RingBuffer;
//! let rb = RingBuffer::<u64, 100>::new(); // ERROR: 100 is not a power of 2
//! ```

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Slot dalam ring buffer. Kepemilikan berpindah antara producer dan consumer
/// lewat protokol cursor, bukan lewat lock.
#[repr(transparent)]
struct Slot<T> {
    data: UnsafeCell<T>,
}

impl<T> Slot<T> {
    const fn new(value: T) -> Self {
        Self {
            data: UnsafeCell::new(value),
        }
    }
}

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Lock-Free SPSC Ring Buffer dengan `N` slot dan `N - 1` entry yang bisa dipakai.
///
/// Cursor write dan read berada di cache line terpisah untuk menghindari false
/// sharing antara producer dan consumer.
///
/// [`push`](Self::push) / [`pop`](Self::pop) mentah bersifat `unsafe` karena
/// producer atau consumer kedua yang berjalan bersamaan adalah undefined
/// behaviour. Gunakan [`split`](Self::split) untuk pasangan [`Producer`] /
/// [`Consumer`] yang aman.
#[repr(C)]
pub struct RingBuffer<T, const N: usize> {
    // Producer side - slot berikutnya untuk ditulis
    write_index: CacheLinePadded<AtomicUsize>,
    // Consumer side - slot berikutnya untuk dibaca
    read_index: CacheLinePadded<AtomicUsize>,
    // Pre-allocated di heap - tidak pernah di-resize
    buffer: Box<[Slot<T>]>,
}

// SAFETY: RingBuffer aman untuk Send/Sync karena:
// - Hanya satu producer (menulis write_index dan slot yang ditunjuknya)
// - Hanya satu consumer (menulis read_index)
// - Release store + Acquire load menjamin visibility setiap slot
unsafe impl<T: Send, const N: usize> Send for RingBuffer<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for RingBuffer<T, N> {}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    const MASK: usize = N - 1;

    const _ASSERT_POW2: () = assert!(
        N >= 2 && N.is_power_of_two(),
        "capacity must be a power of 2 and at least 2"
    );

    /// Membuat ring buffer kosong, setiap slot diisi `T::default()`.
    ///
    /// Alokasi hanya terjadi sekali saat inisialisasi.
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::_ASSERT_POW2;

        let buffer: Box<[Slot<T>]> = (0..N).map(|_| Slot::new(T::default())).collect();

        Self {
            write_index: CacheLinePadded::new(AtomicUsize::new(0)),
            read_index: CacheLinePadded::new(AtomicUsize::new(0)),
            buffer,
        }
    }

    /// Memecah buffer menjadi sisi producer dan consumer.
    ///
    /// Exclusive borrow menjamin hanya ada satu producer dan satu consumer
    /// selama handle masih hidup.
    pub fn split(&mut self) -> (Producer<'_, T, N>, Consumer<'_, T, N>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Push data ke buffer (Producer side)
    ///
    /// Returns `true` jika berhasil, `false` jika buffer penuh (tidak ada yang
    /// ditulis, `value` dibuang).
    ///
    /// # Safety
    ///
    /// Must only be called from one thread at a time (the single producer).
    #[inline(always)]
    pub unsafe fn push(&self, value: T) -> bool {
        let write_idx = self.write_index.value.load(Ordering::Relaxed);
        let next_write = (write_idx + 1) & Self::MASK;

        if next_write == self.read_index.value.load(Ordering::Acquire) {
            return false; // full
        }

        // SAFETY: the consumer never touches the slot at `write_idx` until the
        // store below publishes it.
        unsafe {
            *self.buffer[write_idx].data.get() = value;
        }

        self.write_index.value.store(next_write, Ordering::Release);
        true
    }

    /// Pop data dari buffer ke `out` (Consumer side)
    ///
    /// Returns `true` jika ada data, `false` jika buffer kosong (`out` tidak
    /// diubah).
    ///
    /// # Safety
    ///
    /// Must only be called from one thread at a time (the single consumer).
    #[inline(always)]
    pub unsafe fn pop(&self, out: &mut T) -> bool {
        let read_idx = self.read_index.value.load(Ordering::Relaxed);

        if read_idx == self.write_index.value.load(Ordering::Acquire) {
            return false; // empty
        }

        // SAFETY: the Acquire load above observed the producer's Release store
        // for this slot, and the producer will not reuse it until we advance.
        *out = unsafe { *self.buffer[read_idx].data.get() };

        self.read_index
            .value
            .store((read_idx + 1) & Self::MASK, Ordering::Release);
        true
    }

    /// Jumlah elemen dalam buffer. Hanya perkiraan: bisa basi begitu dibaca.
    #[inline(always)]
    pub fn len(&self) -> usize {
        let read = self.read_index.value.load(Ordering::Acquire);
        let write = self.write_index.value.load(Ordering::Acquire);
        write.wrapping_sub(read) & Self::MASK
    }

    /// Cek apakah buffer kosong
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        let read = self.read_index.value.load(Ordering::Acquire);
        let write = self.write_index.value.load(Ordering::Acquire);
        read == write
    }

    /// Cek apakah buffer penuh (`N - 1` elemen)
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        let write = self.write_index.value.load(Ordering::Acquire);
        let read = self.read_index.value.load(Ordering::Acquire);
        ((write + 1) & Self::MASK) == read
    }

    /// Kapasitas buffer (`N` slot)
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Jumlah elemen maksimum yang bisa disimpan (`N - 1`, satu slot dicadangkan)
    #[inline(always)]
    pub const fn usable_capacity(&self) -> usize {
        N - 1
    }
}

/// Sisi producer dari [`RingBuffer::split`].
pub struct Producer<'a, T, const N: usize> {
    ring: &'a RingBuffer<T, N>,
}

impl<T: Copy + Default, const N: usize> Producer<'_, T, N> {
    /// Push non-blocking. `false` berarti penuh; retry atau buang diserahkan
    /// ke pemanggil.
    #[inline(always)]
    pub fn push(&mut self, value: T) -> bool {
        // SAFETY: `split` hands out one producer and `&mut self` keeps it
        // single-threaded.
        unsafe { self.ring.push(value) }
    }

    /// Jumlah elemen dalam buffer (perkiraan)
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Cek apakah buffer kosong
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Cek apakah buffer penuh
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Kapasitas buffer
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }
}

/// Sisi consumer dari [`RingBuffer::split`].
pub struct Consumer<'a, T, const N: usize> {
    ring: &'a RingBuffer<T, N>,
}

impl<T: Copy + Default, const N: usize> Consumer<'_, T, N> {
    /// Pop non-blocking ke `out`. `false` berarti kosong dan `out` tidak diubah.
    #[inline(always)]
    pub fn pop(&mut self, out: &mut T) -> bool {
        // SAFETY: `split` hands out one consumer and `&mut self` keeps it
        // single-threaded.
        unsafe { self.ring.pop(out) }
    }

    /// Pop sebagai `Option`: `None` jika buffer kosong.
    #[inline(always)]
    pub fn try_pop(&mut self) -> Option<T> {
        let mut value = T::default();
        if self.pop(&mut value) {
            Some(value)
        } else {
            None
        }
    }

    /// Jumlah elemen dalam buffer (perkiraan)
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Cek apakah buffer kosong
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Cek apakah buffer penuh
    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Kapasitas buffer
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }
}
