//! Index-register and flag allocation.
//!
//! Both pools are small fixed register files of the target machine. The low
//! entries are reserved: word 0 reads as "no offset" and flags 0-7 hold
//! constants and comparison results. Everything above is handed out by
//! [`Registers`] and must be returned when the owner is done with it.
//!
//! Freed words remember what they were last loaded with, so a later request
//! for the same constant can reuse the word without reloading it. The cache
//! is dropped wherever control can arrive from elsewhere.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use vvpgen_core::{CodegenError, CodegenResult, SignalId};

use crate::bytecode::Operand;

/// Number of index registers.
pub const WORD_COUNT: usize = 16;
/// Index registers below this are never allocated.
pub const RESERVED_WORDS: usize = 4;
/// Number of flag bits.
pub const FLAG_COUNT: usize = 512;
/// Flags below this are never allocated.
pub const RESERVED_FLAGS: usize = 8;

/// An index register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Word(pub u8);

impl Word {
    /// Register 0: an offset operand of 0 means "no offset".
    pub const NONE: Word = Word(0);
}

impl From<Word> for Operand {
    fn from(w: Word) -> Self {
        Operand::Int(i64::from(w.0))
    }
}

/// A flag bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flag(pub u16);

impl From<Flag> for Operand {
    fn from(f: Flag) -> Self {
        Operand::Int(i64::from(f.0))
    }
}

/// The reserved flags with fixed meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum FixedFlag {
    Zero = 0,
    One = 1,
    X = 2,
    Z = 3,
    /// Equality result; also set by an index load of an unknown value.
    Eq = 4,
    /// Less-than result.
    Lt = 5,
    /// Exact (case) equality result.
    Eeq = 6,
}

impl From<FixedFlag> for Flag {
    fn from(f: FixedFlag) -> Self {
        Flag(f.into())
    }
}

impl FixedFlag {
    /// Whether a flag is one of the reserved ones.
    pub fn is_reserved(flag: Flag) -> bool {
        usize::from(flag.0) < RESERVED_FLAGS
    }
}

/// What a word is known to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordTag {
    Const(i64),
    /// The value of a signal, converted to an integer.
    Signal(SignalId),
}

#[derive(Debug, Clone, Copy, Default)]
struct WordSlot {
    in_use: bool,
    tag: Option<WordTag>,
}

/// Words and flags taken by one lowering step, returned together by
/// [`Registers::release`].
#[derive(Debug, Default)]
pub struct Held {
    words: Vec<Word>,
    flags: Vec<Flag>,
}

impl Held {
    /// Track `word` and hand it back.
    pub fn word(&mut self, word: Word) -> Word {
        self.words.push(word);
        word
    }

    /// Track `flag` and hand it back.
    pub fn flag(&mut self, flag: Flag) -> Flag {
        self.flags.push(flag);
        flag
    }
}

/// Allocation state of both register files.
#[derive(Debug)]
pub struct Registers {
    words: [WordSlot; WORD_COUNT],
    flags: Vec<bool>,
    words_out: usize,
    flags_out: usize,
    lookaside: bool,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Registers {
    pub fn new(lookaside: bool) -> Self {
        Self {
            words: [WordSlot::default(); WORD_COUNT],
            flags: vec![false; FLAG_COUNT],
            words_out: 0,
            flags_out: 0,
            lookaside,
        }
    }

    // =========================================================================
    // Words
    // =========================================================================

    /// Take a free word, preferring one with no cached contents.
    pub fn alloc_word(&mut self) -> CodegenResult<Word> {
        let free = (RESERVED_WORDS..WORD_COUNT).filter(|&i| !self.words[i].in_use);
        let pick = free
            .clone()
            .find(|&i| self.words[i].tag.is_none())
            .or_else(|| free.clone().next());
        let Some(index) = pick else {
            return Err(CodegenError::ResourceExhausted {
                pool: "index register",
                capacity: WORD_COUNT - RESERVED_WORDS,
            });
        };
        let slot = &mut self.words[index];
        slot.in_use = true;
        slot.tag = None;
        self.words_out += 1;
        Ok(Word(index as u8))
    }

    /// Take a word already holding `tag`, if the cache has one.
    pub fn alloc_cached(&mut self, tag: WordTag) -> Option<Word> {
        if !self.lookaside {
            return None;
        }
        let index = (RESERVED_WORDS..WORD_COUNT)
            .find(|&i| !self.words[i].in_use && self.words[i].tag == Some(tag))?;
        self.words[index].in_use = true;
        self.words_out += 1;
        Some(Word(index as u8))
    }

    /// Record what an allocated word now holds.
    pub fn set_tag(&mut self, word: Word, tag: Option<WordTag>) {
        if let Some(slot) = self.words.get_mut(usize::from(word.0)) {
            slot.tag = tag;
        }
    }

    pub fn free_word(&mut self, word: Word) {
        let index = usize::from(word.0);
        if index < RESERVED_WORDS {
            return;
        }
        let slot = &mut self.words[index];
        debug_assert!(slot.in_use, "word {index} freed twice");
        if slot.in_use {
            slot.in_use = false;
            self.words_out -= 1;
        }
    }

    /// Forget every cached word contents.
    pub fn clear_cache(&mut self) {
        for slot in &mut self.words {
            slot.tag = None;
        }
    }

    /// Forget cached copies of a signal that is about to change.
    pub fn forget_signal(&mut self, sig: SignalId) {
        for slot in &mut self.words {
            if slot.tag == Some(WordTag::Signal(sig)) {
                slot.tag = None;
            }
        }
    }

    // =========================================================================
    // Flags
    // =========================================================================

    pub fn alloc_flag(&mut self) -> CodegenResult<Flag> {
        let index = (RESERVED_FLAGS..FLAG_COUNT)
            .find(|&i| !self.flags[i])
            .ok_or(CodegenError::ResourceExhausted {
                pool: "flag",
                capacity: FLAG_COUNT - RESERVED_FLAGS,
            })?;
        self.flags[index] = true;
        self.flags_out += 1;
        Ok(Flag(index as u16))
    }

    /// Return a flag. Reserved flags are ignored.
    pub fn free_flag(&mut self, flag: Flag) {
        let index = usize::from(flag.0);
        if index < RESERVED_FLAGS {
            return;
        }
        debug_assert!(self.flags[index], "flag {index} freed twice");
        if self.flags[index] {
            self.flags[index] = false;
            self.flags_out -= 1;
        }
    }

    /// Return everything `held` tracks.
    pub fn release(&mut self, held: Held) {
        for word in held.words {
            self.free_word(word);
        }
        for flag in held.flags {
            self.free_flag(flag);
        }
    }

    /// Words and flags currently handed out.
    pub fn outstanding(&self) -> (usize, usize) {
        (self.words_out, self.flags_out)
    }
}
